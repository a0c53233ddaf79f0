//! Data types for the deploy flow.

use serde::Deserialize;

/// Identifier/URL pair for a created deployment.
///
/// Created once per publish operation, held only until the deploy reaches
/// its terminal state, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    /// Deployment identifier, used to address status polls.
    pub id: String,
    /// Public base URL of the deployed site.
    pub url: String,
}

/// Response body of the deploy-creation endpoint.
///
/// Netlify answers eventually-consistently: `url`/`id` may be absent on
/// the first response, which the client maps to "no handle yet".
#[derive(Debug, Deserialize)]
pub(crate) struct DeployCreated {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Response body of the deploy-status endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct DeployStatus {
    #[serde(default)]
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_created_tolerates_missing_fields() {
        let parsed: DeployCreated = serde_json::from_str("{}").unwrap();
        assert!(parsed.url.is_none());
        assert!(parsed.id.is_none());

        let parsed: DeployCreated =
            serde_json::from_str(r#"{"url":"https://x.netlify.app","id":"d1","extra":1}"#)
                .unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://x.netlify.app"));
        assert_eq!(parsed.id.as_deref(), Some("d1"));
    }

    #[test]
    fn deploy_status_tolerates_missing_state() {
        let parsed: DeployStatus = serde_json::from_str(r#"{"other":"field"}"#).unwrap();
        assert!(parsed.state.is_none());

        let parsed: DeployStatus = serde_json::from_str(r#"{"state":"ready"}"#).unwrap();
        assert_eq!(parsed.state.as_deref(), Some("ready"));
    }
}
