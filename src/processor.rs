use std::time::Instant;
use tracing::{debug, info};

use crate::config::{ProcessSettings, Settings, MIN_NOTES};
use crate::dbscan::{Clustering, Dbscan};
use crate::error::{Error, Result};
use crate::note::{Note, ProcessResult, ResultPoint};
use crate::summary::summarize;
use crate::tfidf::TfidfVectorizer;
use crate::tsne::{Projection, Tsne};

#[derive(Debug, Default)]
pub struct ProcessTimings {
    pub vectorize_duration: std::time::Duration,
    pub project_duration: std::time::Duration,
    pub cluster_duration: std::time::Duration,
    pub total_duration: std::time::Duration,
}

/// Runs vectorize → project → cluster → summarize over one batch of notes.
///
/// Holds only read-only settings; per-request projection settings are passed
/// to [`NoteProcessor::process`] and never stored.
#[derive(Debug, Clone)]
pub struct NoteProcessor {
    settings: Settings,
}

impl NoteProcessor {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn process(&self, notes: &[Note], request: &ProcessSettings) -> Result<ProcessResult> {
        self.process_with_timings(notes, request).map(|(result, _)| result)
    }

    pub fn process_with_timings(
        &self,
        notes: &[Note],
        request: &ProcessSettings,
    ) -> Result<(ProcessResult, ProcessTimings)> {
        if notes.len() < MIN_NOTES {
            return Err(Error::TooFewNotes {
                required: MIN_NOTES,
                found: notes.len(),
            });
        }

        let start = Instant::now();
        let mut timings = ProcessTimings::default();
        let params = request.merged_over(&self.settings.projection);

        let vectorize_start = Instant::now();
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        let matrix = TfidfVectorizer::new(self.settings.max_features).fit_transform(&contents)?;
        timings.vectorize_duration = vectorize_start.elapsed();

        let project_start = Instant::now();
        let projector = Tsne::new(params.perplexity, params.iterations, params.learning_rate)
            .with_seed(self.settings.seed);
        let points = projector.fit_transform(&matrix.rows)?;
        timings.project_duration = project_start.elapsed();

        let cluster_start = Instant::now();
        let clusterer = Dbscan::default()
            .with_eps(self.settings.dbscan_eps)
            .with_min_samples(self.settings.dbscan_min_samples);
        let labels = clusterer.fit_predict(&points)?;
        timings.cluster_duration = cluster_start.elapsed();

        let summary = summarize(&matrix.rows, &matrix.feature_names, &points, &labels)?;

        let result_points = notes
            .iter()
            .zip(points.iter())
            .zip(labels.iter())
            .zip(summary.notes)
            .map(|(((note, point), &cluster), note_summary)| ResultPoint {
                x: point.x,
                y: point.y,
                title: note.title.clone(),
                path: note.path.clone(),
                top_terms: note_summary.top_terms,
                cluster,
                distance_to_center: note_summary.distance_to_center,
                metadata: note.metadata.clone(),
            })
            .collect();

        let clusters = summary.clusters.len();
        let mut cluster_terms = std::collections::BTreeMap::new();
        let mut cluster_centers = std::collections::BTreeMap::new();
        for (label, cluster) in summary.clusters {
            cluster_terms.insert(label, cluster.terms);
            cluster_centers.insert(label, cluster.centroid);
        }

        timings.total_duration = start.elapsed();
        debug!(
            vectorize = ?timings.vectorize_duration,
            project = ?timings.project_duration,
            cluster = ?timings.cluster_duration,
            "Pipeline stage timings"
        );
        info!(
            notes = notes.len(),
            features = matrix.feature_names.len(),
            clusters,
            elapsed = ?timings.total_duration,
            "Processed notes"
        );

        Ok((
            ProcessResult {
                points: result_points,
                feature_names: matrix.feature_names,
                clusters,
                cluster_terms,
                cluster_centers,
            },
            timings,
        ))
    }
}
