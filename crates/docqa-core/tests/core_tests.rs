use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use docqa_core::config::{Config, Settings};
use docqa_core::error::Error;
use docqa_core::loader::DocumentLoader;

#[test]
fn load_directory_filters_by_extension_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.md"), "# Notes\nSecond file").unwrap();
    fs::write(dir.join("a.txt"), "First file").unwrap();
    fs::write(dir.join("c.bin"), [0u8, 1, 2]).unwrap();
    fs::create_dir(dir.join("sub")).unwrap();
    fs::write(dir.join("sub").join("d.csv"), "x,y,z\n1,2,3").unwrap();

    let docs = DocumentLoader::new().load_path(dir).expect("load");
    let names: Vec<&str> = docs.iter().map(|d| d.doc_id.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.md", "d.csv"]);
    for d in &docs {
        assert_eq!(d.title, d.doc_id);
        assert_eq!(d.source, "file");
    }
}

#[test]
fn load_file_strips_bom_and_tolerates_bad_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bom.txt");
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(b"\xEF\xBB\xBFhello \xFF world").unwrap();
    drop(f);

    let doc = DocumentLoader::new().load_file(&path).expect("load");
    assert!(doc.text.starts_with("hello "));
    assert!(doc.text.ends_with(" world"));
}

#[test]
fn missing_path_is_not_found() {
    let err = DocumentLoader::new().load_path(Path::new("/definitely/not/here")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn custom_extensions() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "text").unwrap();
    fs::write(tmp.path().join("b.log"), "log").unwrap();
    let docs = DocumentLoader::with_extensions(["LOG"]).load_directory(tmp.path()).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].doc_id, "b.log");
}

#[test]
fn config_defaults_without_files() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        let settings = Config::load_from(jail.directory()).map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retrieval.rrf_k, 60.0);
        assert_eq!(settings.storage.text_cap, 1500);
        Ok(())
    });
}

#[test]
fn config_layers_files_then_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [retrieval]
            mmr_top = 4
            rerank_top = 2

            [storage]
            index_dir = "/tmp/base"
            "#,
        )?;
        jail.create_file(
            "config.test.toml",
            r#"
            [retrieval]
            rerank_top = 1
            "#,
        )?;
        jail.set_env("APP_STORAGE__INDEX_DIR", "/tmp/from-env");
        jail.set_env("APP_RETRIEVAL__RRF_K", "10.5");

        let config = Config::load_from(jail.directory()).map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.mmr_top, 4);
        assert_eq!(settings.retrieval.rerank_top, 1);
        assert_eq!(settings.retrieval.rrf_k, 10.5);
        assert_eq!(settings.storage.index_dir, "/tmp/from-env");
        // untouched keys keep their defaults
        assert_eq!(settings.retrieval.vector_width, 24);

        let k: usize = config.get("retrieval.mmr_top").map_err(|e| e.to_string())?;
        assert_eq!(k, 4);
        Ok(())
    });
}

#[test]
fn config_load_reads_working_directory() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "prod");
        jail.create_file("config.toml", "[answer]\nword_budget = 40\n")?;
        jail.create_file("config.prod.toml", "[chunking]\ntarget_tokens = 90\n")?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.answer.word_budget, 40);
        assert_eq!(settings.chunking.target_tokens, 90);
        let budget: usize = config.get("answer.word_budget").map_err(|e| e.to_string())?;
        assert_eq!(budget, 40);
        Ok(())
    });
}

#[test]
fn config_rejects_out_of_range_lambda() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[retrieval]\nmmr_lambda = 1.5\n")?;
        assert!(Config::load_from(jail.directory()).is_err());
        Ok(())
    });
}
