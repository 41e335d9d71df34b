//! Flow definitions: the step list and rules for one onboarding wizard.
//!
//! Flows are TOML files. The built-in flows are embedded in the binary; a
//! project can add flows or override a built-in by name with
//! `.onboard/flows/<name>.toml`.

mod builtin;

pub use builtin::builtin_flows;

use anyhow::{Context, Result};
use glob::glob;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::FlowError;
use crate::step::{StepDefinition, StepRegistry};
use crate::validation::RuleValidator;
use crate::wizard::WizardOptions;

fn default_exit_route() -> String {
    "/".to_string()
}

/// A flow definition as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowFile {
    /// Stable flow name, used on the command line and in drafts
    pub name: String,
    /// Title used in headings and notices
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Route the wizard lives under
    pub route: String,
    /// Route to leave to after submit or cancel
    #[serde(default = "default_exit_route")]
    pub exit_route: String,
    /// Draft store key; defaults to `draft-<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    /// Answer quoted in the success notice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_field: Option<String>,
    pub steps: Vec<StepDefinition>,
    /// File the flow was loaded from; `None` for built-ins
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// A flow ready to mount: the shared registry and its validator.
#[derive(Debug, Clone)]
pub struct BuiltFlow {
    pub registry: Arc<StepRegistry>,
    pub validator: Arc<RuleValidator>,
}

impl FlowFile {
    pub fn from_toml(content: &str) -> Result<Self, FlowError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a flow from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read flow file: {}", path.display()))?;

        let mut flow = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse flow file: {}", path.display()))?;
        flow.source = Some(path.to_path_buf());
        Ok(flow)
    }

    /// Save the flow as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize flow")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write flow file: {}", path.display()))?;
        Ok(())
    }

    pub fn storage_key(&self) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| format!("draft-{}", self.name))
    }

    pub fn is_builtin(&self) -> bool {
        self.source.is_none()
    }

    /// Build the registry and validator, checking the identity field.
    pub fn build(&self) -> Result<BuiltFlow, FlowError> {
        let registry = StepRegistry::new(self.steps.clone())?;

        if let Some(key) = &self.identity_field
            && registry.owner_of(key).is_none()
        {
            return Err(FlowError::UnknownIdentityField(key.clone()));
        }

        let validator = RuleValidator::from_fields(registry.steps().iter().flat_map(|s| &s.fields))?;

        Ok(BuiltFlow {
            registry: Arc::new(registry),
            validator: Arc::new(validator),
        })
    }

    /// Wizard options derived from the flow. Timing and teardown come from
    /// configuration and are left at their defaults here.
    pub fn wizard_options(&self) -> WizardOptions {
        let mut options = WizardOptions::new(&self.name)
            .with_title(&self.title)
            .with_storage_key(&self.storage_key())
            .with_exit_route(&self.exit_route);
        if let Some(key) = &self.identity_field {
            options = options.with_identity_field(key);
        }
        options
    }
}

/// Load every `*.toml` flow in `flows_dir`, sorted by path.
pub fn discover(flows_dir: &Path) -> Result<Vec<FlowFile>> {
    if !flows_dir.exists() {
        return Ok(Vec::new());
    }

    let pattern = flows_dir.join("*.toml").to_string_lossy().to_string();
    let mut paths: Vec<PathBuf> = glob(&pattern)
        .context("Failed to read glob pattern")?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();

    paths.iter().map(|p| FlowFile::load(p)).collect()
}

/// Built-in flows overlaid with project flows, sorted by name.
pub fn load_all(flows_dir: Option<&Path>) -> Result<Vec<FlowFile>> {
    let mut flows: BTreeMap<String, FlowFile> = builtin_flows()
        .context("Built-in flow definitions are invalid")?
        .into_iter()
        .map(|f| (f.name.clone(), f))
        .collect();

    if let Some(dir) = flows_dir {
        for flow in discover(dir)? {
            flows.insert(flow.name.clone(), flow);
        }
    }

    Ok(flows.into_values().collect())
}

/// Find a flow by name.
pub fn find(flows_dir: Option<&Path>, name: &str) -> Result<Option<FlowFile>> {
    Ok(load_all(flows_dir)?.into_iter().find(|f| f.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerSet;
    use crate::step::FieldDefinition;
    use tempfile::tempdir;

    const SMALL_FLOW: &str = r#"
name = "badge"
title = "Badge request"
route = "/badges/new"

[[steps]]
name = "holder"
title = "Holder"

[[steps.fields]]
key = "holder_name"
label = "Holder name"
rules = { required = true }

[[steps]]
name = "access"
title = "Access"

[[steps.fields]]
key = "zones"
label = "Zones"
kind = "list"
rules = { min_items = 1 }
"#;

    // =========================================
    // parsing tests
    // =========================================

    #[test]
    fn test_parse_flow() {
        let flow = FlowFile::from_toml(SMALL_FLOW).unwrap();
        assert_eq!(flow.name, "badge");
        assert_eq!(flow.exit_route, "/");
        assert_eq!(flow.storage_key(), "draft-badge");
        assert_eq!(flow.steps.len(), 2);
        assert!(flow.steps[0].fields[0].rules.required);
        assert!(flow.is_builtin());
    }

    #[test]
    fn test_parse_error() {
        let err = FlowFile::from_toml("name = ").unwrap_err();
        assert!(matches!(err, FlowError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("badge.toml");
        let flow = FlowFile::from_toml(SMALL_FLOW).unwrap();
        flow.save(&path).unwrap();

        let loaded = FlowFile::load(&path).unwrap();
        assert_eq!(loaded.name, flow.name);
        assert_eq!(loaded.steps.len(), 2);
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
    }

    // =========================================
    // build tests
    // =========================================

    #[test]
    fn test_build_registry_and_validator() {
        let built = FlowFile::from_toml(SMALL_FLOW).unwrap().build().unwrap();
        assert_eq!(built.registry.len(), 2);

        let subset = AnswerSet::new().subset(["holder_name", "zones"]);
        let errors = built.validator.check(&subset);
        assert_eq!(errors.get("holder_name").unwrap(), "Holder name is required");
        assert_eq!(errors.get("zones").unwrap(), "Select at least 1 zones");
    }

    #[test]
    fn test_build_rejects_unknown_identity_field() {
        let mut flow = FlowFile::from_toml(SMALL_FLOW).unwrap();
        flow.identity_field = Some("nope".to_string());
        assert!(matches!(
            flow.build().unwrap_err(),
            FlowError::UnknownIdentityField(ref k) if k == "nope"
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_field() {
        let mut flow = FlowFile::from_toml(SMALL_FLOW).unwrap();
        flow.steps[1]
            .fields
            .push(FieldDefinition::new("holder_name", "Again"));
        assert!(matches!(flow.build().unwrap_err(), FlowError::Registry(_)));
    }

    #[test]
    fn test_wizard_options_from_flow() {
        let mut flow = FlowFile::from_toml(SMALL_FLOW).unwrap();
        flow.identity_field = Some("holder_name".to_string());
        let options = flow.wizard_options();
        assert_eq!(options.flow, "badge");
        assert_eq!(options.title, "Badge request");
        assert_eq!(options.storage_key, "draft-badge");
        assert_eq!(options.identity_field.as_deref(), Some("holder_name"));
    }

    // =========================================
    // discovery tests
    // =========================================

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(discover(&dir.path().join("flows")).unwrap().is_empty());
    }

    #[test]
    fn test_project_flow_overrides_builtin() {
        let dir = tempdir().unwrap();
        let override_flow = SMALL_FLOW.replace("name = \"badge\"", "name = \"organization\"");
        std::fs::write(dir.path().join("organization.toml"), override_flow).unwrap();
        std::fs::write(dir.path().join("badge.toml"), SMALL_FLOW).unwrap();

        let flows = load_all(Some(dir.path())).unwrap();
        let names: Vec<&str> = flows.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["application", "badge", "invite-user", "organization"]);

        let org = find(Some(dir.path()), "organization").unwrap().unwrap();
        assert_eq!(org.title, "Badge request");
        assert!(!org.is_builtin());
    }

    #[test]
    fn test_find_unknown() {
        assert!(find(None, "nope").unwrap().is_none());
    }
}
