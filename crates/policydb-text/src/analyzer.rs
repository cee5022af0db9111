use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};

/// Terms shorter than this are discarded.
pub const MIN_TERM_LEN: usize = 2;

const STOP_WORDS: &[&str] = &[
	"a","about","above","after","again","against","all","also","am","an","and","any","are","as","at","be","been","before","being","below","between","both","but","by",
	"can","could","did","do","does","doing","down","during","each","few","for","from","further","had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
	"i","if","in","into","is","it","its","itself","may","me","might","more","most","must","my","myself","no","nor","not","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
	"same","shall","she","should","so","some","such","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
	"under","until","up","upon","very","was","we","were","what","when","where","which","while","who","whom","whose","why","will","with","would","you","your","yours","yourself","yourselves",
];

fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build()
}

/// Tokenize, lowercase and drop stop words and single-character terms.
/// Term order follows the input; duplicates are kept.
pub fn analyze(text: &str) -> Vec<String> {
	let mut analyzer = build_analyzer();
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() {
		let term = &stream.token().text;
		if term.chars().count() >= MIN_TERM_LEN {
			terms.push(term.clone());
		}
	}
	terms
}
