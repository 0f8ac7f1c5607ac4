//! Sparse lexical tier: TF-IDF vectors with English stop words removed.

use super::{rank_by_score, RetrievalStrategy, StrategyKind};
use crate::error::AdvisorError;
use crate::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Sparse row, sorted by term index.
pub type SparseVector = Vec<(usize, f32)>;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
    "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
    "amongst", "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone",
    "anything", "anyway", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "becomes", "becoming", "been", "before", "beforehand", "behind",
    "being", "below", "beside", "besides", "between", "beyond", "bill", "both", "bottom",
    "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry",
    "de", "describe", "detail", "do", "done", "down", "due", "during", "each", "eg",
    "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen",
    "fifty", "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go", "had", "has",
    "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred",
    "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its",
    "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many",
    "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem",
    "seemed", "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
    "that", "the", "their", "them", "themselves", "then", "thence", "there", "thereafter",
    "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus",
    "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
    "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(term: &str) -> bool {
    ENGLISH_STOP_WORDS.contains(&term)
}

/// Lower-cased runs of two or more word characters, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Vocabulary and smoothed idf weights fitted over a corpus.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fit over `documents` and return the vectorizer with one row per document.
    pub fn fit_transform(documents: &[String]) -> Result<(Self, Vec<SparseVector>)> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();

        if terms.is_empty() {
            return Err(AdvisorError::Indexing(
                "empty vocabulary; documents contain only stop words".to_string(),
            ));
        }

        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: BTreeSet<&String> = tokens.iter().collect();
            for term in unique {
                df[vocabulary[term.as_str()]] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0)
            .collect();

        let vectorizer = Self { vocabulary, idf };
        let rows = tokenized.iter().map(|t| vectorizer.weigh(t)).collect();

        Ok((vectorizer, rows))
    }

    /// Project text into the fitted space; unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&tokenize(text))
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }

        row
    }
}

/// Dot product of two index-sorted sparse rows (cosine, as rows are unit length).
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// TF-IDF tier. Needs no external capability, so it is always available.
#[derive(Default)]
pub struct TfidfStrategy {
    fitted: Option<(TfidfVectorizer, Vec<SparseVector>)>,
}

impl TfidfStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetrievalStrategy for TfidfStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tfidf
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn reindex(&mut self, documents: &[String]) -> Result<()> {
        self.fitted = Some(TfidfVectorizer::fit_transform(documents)?);
        Ok(())
    }

    async fn rank(&self, query: &str, documents: &[String]) -> Result<Vec<usize>> {
        let (vectorizer, rows) = self
            .fitted
            .as_ref()
            .ok_or_else(|| AdvisorError::Retrieval("TF-IDF index not fitted".to_string()))?;

        if rows.len() != documents.len() {
            return Err(AdvisorError::Retrieval(format!(
                "TF-IDF index covers {} documents, collection has {}",
                rows.len(),
                documents.len()
            )));
        }

        let q = vectorizer.transform(query);
        let scores: Vec<f32> = rows.iter().map(|row| sparse_dot(row, &q)).collect();

        Ok(rank_by_score(&scores))
    }
}
