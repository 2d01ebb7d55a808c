
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use crate::error::Result;

/// All positions of one term inside one document field.
#[derive(Clone, Debug, PartialEq)]
pub struct TermOccurrences {
    pub term: String,
    pub positions: Vec<usize>,
}

impl TermOccurrences {
    pub fn frequency(&self) -> usize {
        self.positions.len()
    }
}

/// Term-position data for one document field, as stored by the index.
pub type TermPositions = Vec<TermOccurrences>;

/// One unit of work: a document field and its term positions.
#[derive(Clone, Debug)]
pub struct DocumentTerms {
    pub doc_id: usize,
    pub field: String,
    pub terms: TermPositions,
}

/// Read access to an indexed corpus.
pub trait Corpus: Send + Sync {

    fn num_docs(&self) -> usize;

    /// Whether the index stored term positions at all.
    fn has_positions(&self) -> bool;

    /// Every distinct term of `field`, filtered or not.
    fn terms(&self, field: &str) -> Vec<String>;

    /// `Ok(None)` when the document has no position data for `field`.
    fn term_vector(&self, doc_id: usize, field: &str) -> Result<Option<TermPositions>>;

    fn global_term_frequency(&self, field: &str, term: &str) -> u64;

    fn global_term_weight(&self, field: &str, term: &str) -> f32;

    fn term_passes_filter(&self, field: &str, term: &str) -> bool;

    fn external_document_id(&self, doc_id: usize) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermWeighting {
    Uniform,
    /// ln(number of documents / document frequency)
    Idf,
}

#[derive(Clone, Debug, Default)]
struct FieldStats {
    term_frequencies: HashMap<String, u64>,
    doc_frequencies: HashMap<String, u64>,
}

#[derive(Clone, Debug)]
struct MemoryDocument {
    external_id: String,
    fields: HashMap<String, Vec<String>>,
}

/// A corpus held in memory as pre-tokenized documents.
#[derive(Clone, Debug)]
pub struct MemoryCorpus {
    documents: Vec<MemoryDocument>,
    stats: HashMap<String, FieldStats>,
    min_frequency: u64,
    weighting: TermWeighting,
}

impl Default for MemoryCorpus {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            stats: HashMap::new(),
            min_frequency: 0,
            weighting: TermWeighting::Uniform,
        }
    }
}

impl MemoryCorpus {

    pub fn new() -> MemoryCorpus {
        MemoryCorpus::default()
    }

    /// One field, documents named by their index.
    pub fn from_documents(field: &str, documents: Vec<Vec<String>>) -> MemoryCorpus {
        let mut corpus = MemoryCorpus::new();
        for (i, tokens) in documents.into_iter().enumerate() {
            corpus.push_document(&format!("doc{}", i), vec![(field.to_string(), tokens)]);
        }
        corpus
    }

    pub fn with_min_frequency(mut self, min_frequency: u64) -> MemoryCorpus {
        self.min_frequency = min_frequency;
        self
    }

    pub fn with_weighting(mut self, weighting: TermWeighting) -> MemoryCorpus {
        self.weighting = weighting;
        self
    }

    pub fn push_document(&mut self, external_id: &str, fields: Vec<(String, Vec<String>)>) {

        for (field, tokens) in &fields {
            let stats = self.stats.entry(field.to_owned()).or_default();
            for tok in tokens {
                *stats.term_frequencies.entry(tok.to_owned()).or_insert(0) += 1;
            }
            let mut seen: Vec<&String> = tokens.iter().collect();
            seen.sort();
            seen.dedup();
            for tok in seen {
                *stats.doc_frequencies.entry(tok.to_owned()).or_insert(0) += 1;
            }
        }

        self.documents.push(MemoryDocument {
            external_id: external_id.to_string(),
            fields: fields.into_iter().collect(),
        });
    }

    fn frequency(&self, field: &str, term: &str, doc_level: bool) -> u64 {
        self.stats.get(field)
        .and_then(|stats| {
            let counts = if doc_level { &stats.doc_frequencies } else { &stats.term_frequencies };
            counts.get(term).copied()
        })
        .unwrap_or(0)
    }
}

impl Corpus for MemoryCorpus {

    fn num_docs(&self) -> usize {
        self.documents.len()
    }

    fn has_positions(&self) -> bool {
        true
    }

    fn terms(&self, field: &str) -> Vec<String> {
        let mut terms: Vec<String> = match self.stats.get(field) {
            Some(stats) => stats.term_frequencies.keys().cloned().collect(),
            None => Vec::new(),
        };
        terms.sort();
        terms
    }

    fn term_vector(&self, doc_id: usize, field: &str) -> Result<Option<TermPositions>> {

        let tokens = match self.documents.get(doc_id).and_then(|doc| doc.fields.get(field)) {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => return Ok(None),
        };

        // group positions by term, in term order like an inverted index would
        let mut grouped: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (position, tok) in tokens.iter().enumerate() {
            grouped.entry(tok.as_str()).or_default().push(position);
        }
        let terms = grouped.into_iter()
        .map(|(term, positions)| TermOccurrences { term: term.to_string(), positions })
        .collect();

        Ok(Some(terms))
    }

    fn global_term_frequency(&self, field: &str, term: &str) -> u64 {
        self.frequency(field, term, false)
    }

    fn global_term_weight(&self, field: &str, term: &str) -> f32 {
        match self.weighting {
            TermWeighting::Uniform => 1.0,
            TermWeighting::Idf => {
                let df = self.frequency(field, term, true);
                if df == 0 {
                    return 0.0;
                }
                (self.documents.len() as f32 / df as f32).ln()
            }
        }
    }

    fn term_passes_filter(&self, field: &str, term: &str) -> bool {
        let frequency = self.frequency(field, term, false);
        frequency > 0 && frequency >= self.min_frequency
    }

    fn external_document_id(&self, doc_id: usize) -> String {
        match self.documents.get(doc_id) {
            Some(doc) => doc.external_id.to_owned(),
            None => doc_id.to_string(),
        }
    }
}
