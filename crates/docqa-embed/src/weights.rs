use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// `model.safetensors` when present, else the `pytorch_model.bin` pickle.
pub(crate) fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        info!(file = %safetensors.display(), "loading weights");
        // SAFETY: the mapped file is only read and is not modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if !pickle.exists() {
        return Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()));
    }
    info!(file = %pickle.display(), "loading weights");
    let weights = candle_core::pickle::read_all(&pickle)?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}
