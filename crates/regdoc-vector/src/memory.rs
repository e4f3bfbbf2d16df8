use std::collections::{HashMap, HashSet};

use regdoc_core::error::{Error, Result};
use regdoc_core::traits::VectorIndex;
use regdoc_core::types::{DistanceMetric, IndexStats, Metadata, RecordId, SearchResult, VectorRecord};

use crate::distance::{dot, euclidean, normalized};
use crate::IndexConfig;

/// Exhaustive-scan index held in memory.
///
/// Records keep insertion order, so equal scores rank the older record first.
#[derive(Debug, Clone)]
pub struct InMemoryIndex {
    config: IndexConfig,
    records: Vec<VectorRecord>,
    positions: HashMap<RecordId, usize>,
    next_seq: u64,
}

impl InMemoryIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self { config, records: Vec::new(), positions: HashMap::new(), next_seq: 0 }
    }

    pub fn config(&self) -> &IndexConfig { &self.config }
    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    fn prepare(&self, what: &str, position: usize, embedding: &[f32]) -> Result<Vec<f32>> {
        if embedding.len() != self.config.dimension() {
            return Err(Error::InvalidInput(format!(
                "{what} {position} has dimension {}, index '{}' expects {}",
                embedding.len(),
                self.config.name(),
                self.config.dimension()
            )));
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidInput(format!("{what} {position} has a non-finite component")));
        }
        normalized(embedding).ok_or_else(|| Error::InvalidInput(format!("{what} {position} has zero norm")))
    }

    fn next_id(&mut self) -> RecordId {
        loop {
            let id = format!("{}-{}", self.config.name(), self.next_seq);
            self.next_seq += 1;
            if !self.positions.contains_key(&id) {
                return id;
            }
        }
    }

    fn reindex(&mut self) {
        self.positions = self.records.iter().enumerate().map(|(i, r)| (r.id.clone(), i)).collect();
    }
}

fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(key, value)| metadata.get(key) == Some(value))
}

impl VectorIndex for InMemoryIndex {
    fn add(
        &mut self,
        texts: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        metadata: Option<Vec<Metadata>>,
        ids: Option<Vec<RecordId>>,
    ) -> Result<Vec<RecordId>> {
        let n = texts.len();
        if embeddings.len() != n {
            return Err(Error::InvalidInput(format!("{} embeddings for {n} texts", embeddings.len())));
        }
        if let Some(m) = &metadata {
            if m.len() != n {
                return Err(Error::InvalidInput(format!("{} metadata entries for {n} texts", m.len())));
            }
        }
        if let Some(ids) = &ids {
            if ids.len() != n {
                return Err(Error::InvalidInput(format!("{} ids for {n} texts", ids.len())));
            }
            let mut seen = HashSet::with_capacity(n);
            if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
                return Err(Error::InvalidInput(format!("duplicate id '{dup}' in one add call")));
            }
        }

        // validate everything before the first write
        let vectors = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| self.prepare("embedding", i, e))
            .collect::<Result<Vec<_>>>()?;

        let ids = match ids {
            Some(ids) => ids,
            None => (0..n).map(|_| self.next_id()).collect(),
        };
        let metadata = metadata.unwrap_or_else(|| vec![Metadata::new(); n]);

        for (((id, text), embedding), metadata) in ids.iter().zip(texts).zip(vectors).zip(metadata) {
            let record = VectorRecord { id: id.clone(), text, embedding, metadata };
            match self.positions.get(id) {
                Some(&pos) => self.records[pos] = record,
                None => {
                    self.positions.insert(id.clone(), self.records.len());
                    self.records.push(record);
                }
            }
        }
        tracing::debug!(index = self.config.name(), added = n, total = self.records.len(), "added records");
        Ok(ids)
    }

    fn search(&self, query: &[f32], k: usize, filter: Option<&Metadata>) -> Result<Vec<SearchResult>> {
        let query = self.prepare("query", 0, query)?;
        if k == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }

        let metric = self.config.metric();
        let score: fn(&[f32], &[f32]) -> f32 = match metric {
            DistanceMetric::Cosine | DistanceMetric::Dot => dot,
            DistanceMetric::Euclidean => euclidean,
        };
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.map_or(true, |f| matches_filter(&r.metadata, f)))
            .map(|(i, r)| (i, score(&query, &r.embedding)))
            .collect();

        if metric.higher_is_better() {
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        } else {
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        }
        scored.truncate(k);

        tracing::debug!(index = self.config.name(), metric = %metric, k, hits = scored.len(), "searched index");
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { record: self.records[i].clone(), score })
            .collect())
    }

    fn get(&self, id: &str) -> Option<VectorRecord> {
        self.positions.get(id).map(|&pos| self.records[pos].clone())
    }

    fn delete(&mut self, ids: &[RecordId]) -> bool {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).filter(|id| self.positions.contains_key(*id)).collect();
        if doomed.is_empty() {
            return false;
        }
        self.records.retain(|r| !doomed.contains(r.id.as_str()));
        self.reindex();
        tracing::debug!(index = self.config.name(), removed = doomed.len(), "deleted records");
        true
    }

    fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            count: self.records.len(),
            dimension: self.config.dimension(),
            name: self.config.name().to_string(),
            metric: self.config.metric(),
        }
    }
}
