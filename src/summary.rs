use std::collections::BTreeMap;

use crate::config::{Number, MIN_NOTES};
use crate::dbscan::{cluster_count, NOISE};
use crate::error::{Error, Result};
use crate::note::{Point2D, TermScore};
use crate::vector_ops::{column_sums, top_positive_indices};

pub const CLUSTER_TOP_TERMS: usize = 10;
pub const NOTE_TOP_TERMS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub terms: Vec<TermScore>,
    pub centroid: Point2D,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSummary {
    pub top_terms: Vec<String>,
    pub distance_to_center: Option<Number>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub clusters: BTreeMap<i32, ClusterSummary>,
    pub notes: Vec<NoteSummary>,
}

impl Summary {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }
}

/// Describe each cluster and each note from row-aligned features, points and labels.
///
/// Term lists are ordered by ascending score and only hold strictly positive
/// entries, so they may be shorter than the requested top-N.
pub fn summarize(
    rows: &[Vec<Number>],
    feature_names: &[String],
    points: &[Point2D],
    labels: &[i32],
) -> Result<Summary> {
    let n = rows.len();
    if n < MIN_NOTES {
        return Err(Error::TooFewNotes {
            required: MIN_NOTES,
            found: n,
        });
    }
    for len in [points.len(), labels.len()] {
        if len != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: len,
            });
        }
    }
    let width = feature_names.len();
    if let Some(row) = rows.iter().find(|r| r.len() != width) {
        return Err(Error::DimensionMismatch {
            expected: width,
            found: row.len(),
        });
    }

    let mut members: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label != NOISE {
            members.entry(label).or_default().push(i);
        }
    }

    let clusters: BTreeMap<i32, ClusterSummary> = members
        .iter()
        .map(|(&label, indices)| {
            let sums = column_sums(rows, indices, width);
            let terms = top_positive_indices(&sums, CLUSTER_TOP_TERMS)
                .into_iter()
                .map(|idx| TermScore {
                    term: feature_names[idx].clone(),
                    score: sums[idx],
                })
                .collect();
            (
                label,
                ClusterSummary {
                    terms,
                    centroid: centroid(points, indices),
                },
            )
        })
        .collect();

    let notes = rows
        .iter()
        .zip(points.iter().zip(labels))
        .map(|(row, (point, label))| NoteSummary {
            top_terms: top_positive_indices(row, NOTE_TOP_TERMS)
                .into_iter()
                .map(|idx| feature_names[idx].clone())
                .collect(),
            distance_to_center: clusters
                .get(label)
                .map(|cluster| point.distance(&cluster.centroid)),
        })
        .collect();

    debug_assert_eq!(clusters.len(), cluster_count(labels));

    Ok(Summary { clusters, notes })
}

/// Arithmetic mean of the selected points.
pub fn centroid(points: &[Point2D], indices: &[usize]) -> Point2D {
    let count = indices.len().max(1) as Number;
    let (sx, sy) = indices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &i| (sx + points[i].x, sy + points[i].y));
    Point2D::new(sx / count, sy / count)
}
