use serde::{Deserialize, Serialize};

/// One side of a suggested link.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ConnectionNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ConnectionRequest {
    pub source_note: Option<ConnectionNote>,
    pub target_note: Option<ConnectionNote>,
    #[serde(default)]
    pub common_terms: Vec<String>,
    #[serde(default)]
    pub cluster_terms: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionTemplate {
    ConceptualOverlap,
    Complement,
    FurtherReading,
    DifferentAngles,
    DeeperUnderstanding,
}

impl ConnectionTemplate {
    pub const ALL: [ConnectionTemplate; 5] = [
        ConnectionTemplate::ConceptualOverlap,
        ConnectionTemplate::Complement,
        ConnectionTemplate::FurtherReading,
        ConnectionTemplate::DifferentAngles,
        ConnectionTemplate::DeeperUnderstanding,
    ];

    /// Fill the template with the two titles and comma-joined term lists.
    pub fn render(
        self,
        source_title: &str,
        target_title: &str,
        common_terms: &[String],
        cluster_terms: &[String],
    ) -> String {
        let common = common_terms.join(", ");
        let cluster = cluster_terms.join(", ");
        let or = |joined: &str, fallback: &str| -> String {
            if joined.is_empty() {
                fallback.to_string()
            } else {
                joined.to_string()
            }
        };

        match self {
            ConnectionTemplate::ConceptualOverlap => format!(
                "These notes share conceptual overlap around {}. '{}' expands on ideas found in '{}', particularly regarding {}.",
                or(&common, "related topics"),
                target_title,
                source_title,
                or(&cluster, "these concepts"),
            ),
            ConnectionTemplate::Complement => format!(
                "The note '{}' provides valuable context that complements '{}'. They both explore themes related to {}.",
                target_title,
                source_title,
                or(&common, "similar subjects"),
            ),
            ConnectionTemplate::FurtherReading => format!(
                "While reading '{}', you may want to reference '{}' for additional perspectives on {}. They share a focus on {}.",
                source_title,
                target_title,
                or(&cluster, "related ideas"),
                or(&common, "connected topics"),
            ),
            ConnectionTemplate::DifferentAngles => format!(
                "'{}' and '{}' approach similar questions from different angles. Both discuss aspects of {}, making them natural companions.",
                source_title,
                target_title,
                or(&common, "related concepts"),
            ),
            ConnectionTemplate::DeeperUnderstanding => format!(
                "To deepen your understanding of topics in '{}', '{}' offers complementary insights, especially regarding {}.",
                source_title,
                target_title,
                or(&common, "shared concepts"),
            ),
        }
    }
}

/// Describe the link between the request's two notes using `template`.
///
/// Returns `None` when either note is missing.
pub fn describe_connection(
    request: &ConnectionRequest,
    template: ConnectionTemplate,
) -> Option<String> {
    let source = request.source_note.as_ref()?;
    let target = request.target_note.as_ref()?;
    Some(template.render(
        &source.title,
        &target.title,
        &request.common_terms,
        &request.cluster_terms,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ConnectionRequest {
        ConnectionRequest {
            source_note: Some(ConnectionNote {
                title: "Deep Learning".into(),
                content: String::new(),
                terms: vec![],
            }),
            target_note: Some(ConnectionNote {
                title: "Neural Networks".into(),
                content: String::new(),
                terms: vec![],
            }),
            common_terms: vec!["neural".into(), "learning".into()],
            cluster_terms: vec![],
        }
    }

    #[test]
    fn test_render_joins_terms() {
        let text = describe_connection(&request(), ConnectionTemplate::DifferentAngles).unwrap();
        assert_eq!(
            text,
            "'Deep Learning' and 'Neural Networks' approach similar questions from different angles. \
             Both discuss aspects of neural, learning, making them natural companions."
        );
    }

    #[test]
    fn test_render_falls_back_on_empty_terms() {
        let text = describe_connection(&request(), ConnectionTemplate::ConceptualOverlap).unwrap();
        assert!(text.ends_with("particularly regarding these concepts."));
        assert!(text.contains("'Neural Networks' expands on ideas found in 'Deep Learning'"));
    }

    #[test]
    fn test_every_template_names_both_notes() {
        for template in ConnectionTemplate::ALL {
            let text = describe_connection(&request(), template).unwrap();
            assert!(text.contains("Deep Learning"));
            assert!(text.contains("Neural Networks"));
        }
    }

    #[test]
    fn test_missing_note() {
        let mut req = request();
        req.target_note = None;
        assert!(describe_connection(&req, ConnectionTemplate::Complement).is_none());
    }
}
