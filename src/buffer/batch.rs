use crate::domain::Sample;
use std::time::Instant;
use uuid::Uuid;

/// Samples gathered during one report cycle, sent together in one transport call.
#[derive(Debug, Clone)]
pub struct Batch {
    id: String,
    samples: Vec<Sample>,
    created_at: Instant,
}

impl Batch {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            samples: Vec::with_capacity(capacity),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drops pending samples and starts a fresh batch under a new id.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.id = Uuid::new_v4().to_string();
        self.created_at = Instant::now();
    }

    /// Hands the pending samples over and leaves an empty batch in place.
    pub fn take(&mut self) -> Batch {
        let capacity = self.samples.len();
        std::mem::replace(self, Batch::with_capacity(capacity))
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}
