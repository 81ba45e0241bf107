use docqa_text::{tokenize, LexicalIndex};

fn corpus() -> Vec<&'static str> {
	vec![
		"Paris is the capital of France",
		"Berlin is the capital of Germany",
		"The Loire valley grows grapes",
		"france france france exports wine",
	]
}

#[test]
fn exact_terms_rank_matching_docs() {
	let index = LexicalIndex::build(&corpus()).expect("build");
	assert_eq!(index.len(), 4);

	let hits = index.top_k("France", 10).expect("search");
	let positions: Vec<usize> = hits.iter().map(|h| h.1).collect();
	// higher term frequency wins; non-matching docs are absent
	assert_eq!(positions, vec![3, 0]);
	assert!(hits[0].0 >= hits[1].0);
}

#[test]
fn respects_k_and_orders_scores() {
	let index = LexicalIndex::build(&corpus()).expect("build");
	let hits = index.top_k("capital of germany", 1).expect("search");
	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].1, 1);

	let all = index.top_k("the", 10).expect("search");
	assert_eq!(all.len(), 3);
	assert!(all.windows(2).all(|w| w[0].0 >= w[1].0));
}

#[test]
fn empty_or_unknown_queries() {
	let index = LexicalIndex::build(&corpus()).expect("build");
	assert!(index.top_k("", 5).expect("search").is_empty());
	assert!(index.top_k("   ", 5).expect("search").is_empty());
	assert!(index.top_k("zebra", 5).expect("search").is_empty());
	assert!(index.top_k("france", 0).expect("search").is_empty());
}

#[test]
fn tokens_are_whitespace_split_only() {
	assert_eq!(tokenize("Hello, World!  again"), vec!["hello,", "world!", "again"]);
	let index = LexicalIndex::build(&["capital of france."]).expect("build");
	// punctuation stays attached to the token
	assert!(index.top_k("france", 5).expect("search").is_empty());
	assert_eq!(index.top_k("FRANCE.", 5).expect("search").len(), 1);
}

#[test]
fn empty_corpus() {
	let texts: Vec<String> = vec![];
	let index = LexicalIndex::build(&texts).expect("build");
	assert!(index.is_empty());
	assert!(index.top_k("anything", 3).expect("search").is_empty());
}
