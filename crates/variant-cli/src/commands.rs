//! Command implementations

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use serde::Serialize;
use variant_core::{
    BuildOptions, GlobalState, GlobalStateChangeCallback, LoadedScene, SceneDescriptor,
    StateChangeCallback, VariantError, VariantId, VariantSetId, VariantSetManager,
};

use crate::config::OutputFormat;

/// Observed state of one variant set
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SetState {
    pub name: String,
    pub active: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantListing {
    pub id: VariantId,
    pub name: String,
    pub thumbnail: Option<String>,
    pub default: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetListing {
    pub id: VariantSetId,
    pub name: String,
    pub variants: Vec<VariantListing>,
}

/// A notification observed while activating
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Notification {
    StateChange {
        variant_set: String,
        active: Vec<VariantId>,
    },
    GlobalStateChange(GlobalState),
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationStep {
    pub variant_set: String,
    pub variant: String,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationReport {
    pub steps: Vec<ActivationStep>,
    pub state: Vec<SetState>,
}

/// Load a scene description; `.json` files are read as JSON, anything else
/// as RON
pub fn load_scene(path: &Path, options: BuildOptions) -> Result<LoadedScene> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;

    let descriptor = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => SceneDescriptor::from_json_str(&content)?,
        _ => SceneDescriptor::from_ron_str(&content)?,
    };

    descriptor
        .build(options)
        .with_context(|| format!("failed to build scene from {:?}", path))
}

pub fn state_report(manager: &VariantSetManager) -> Vec<SetState> {
    (0..manager.len())
        .map(|id| {
            let names = manager.variant_names(id);
            SetState {
                name: manager.name(id).unwrap_or_default().to_string(),
                active: manager
                    .state(id)
                    .unwrap_or_default()
                    .iter()
                    .map(|&v| names[v].to_string())
                    .collect(),
            }
        })
        .collect()
}

pub fn list_report(manager: &VariantSetManager) -> Vec<SetListing> {
    manager
        .variant_sets()
        .iter()
        .enumerate()
        .map(|(id, set)| {
            let active = manager.state(id).unwrap_or_default();
            SetListing {
                id,
                name: set.name().to_string(),
                variants: set
                    .variants()
                    .iter()
                    .enumerate()
                    .map(|(variant_id, variant)| VariantListing {
                        id: variant_id,
                        name: variant.name().to_string(),
                        thumbnail: variant.thumbnail_source().map(str::to_string),
                        default: variant.is_active_by_default(),
                        active: active.contains(&variant_id),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Split a `SET=VARIANT` argument
pub fn parse_target(target: &str) -> Result<(&str, &str)> {
    match target.split_once('=') {
        Some((set, variant)) if !set.is_empty() && !variant.is_empty() => Ok((set, variant)),
        _ => bail!("expected SET=VARIANT, got '{}'", target),
    }
}

/// Resolve a set and a variant given by name or index
pub fn resolve_target(
    manager: &VariantSetManager,
    set: &str,
    variant: &str,
) -> Result<(VariantSetId, VariantId), VariantError> {
    let set_id = manager
        .find_variant_set(set)
        .or_else(|| set.parse().ok().filter(|&id| id < manager.len()))
        .ok_or_else(|| VariantError::UnknownVariantSet(set.to_string()))?;

    let set_len = manager.variant_ids(set_id).len();
    let variant_id = manager
        .find_variant(set_id, variant)
        .or_else(|| variant.parse().ok().filter(|&id| id < set_len))
        .ok_or_else(|| VariantError::UnknownVariant {
            variant_set: manager.name(set_id).unwrap_or_default().to_string(),
            variant: variant.to_string(),
        })?;

    Ok((set_id, variant_id))
}

/// Activate targets in order, recording every notification
pub fn run_activate(
    manager: &mut VariantSetManager,
    targets: &[String],
) -> Result<ActivationReport> {
    let log: Arc<Mutex<Vec<Notification>>> = Arc::new(Mutex::new(Vec::new()));

    for id in 0..manager.len() {
        let sink = log.clone();
        let variant_set = manager.name(id).unwrap_or_default().to_string();
        let callback: StateChangeCallback = Arc::new(move |active: &[VariantId]| {
            sink.lock().push(Notification::StateChange {
                variant_set: variant_set.clone(),
                active: active.to_vec(),
            });
        });
        manager.on_state_change(id, callback)?;
    }

    let sink = log.clone();
    let global: GlobalStateChangeCallback = Arc::new(move |state: &[Vec<VariantId>]| {
        sink.lock().push(Notification::GlobalStateChange(state.to_vec()));
    });
    manager.on_global_state_change(global);

    let mut steps = Vec::with_capacity(targets.len());
    for target in targets {
        let (set, variant) = parse_target(target)?;
        let (set_id, variant_id) = resolve_target(manager, set, variant)?;

        let changed = manager.activate(set_id, variant_id)?;
        tracing::info!(pair = %target, changed = changed.len(), "Activated");

        steps.push(ActivationStep {
            variant_set: manager.name(set_id).unwrap_or_default().to_string(),
            variant: manager.variant_names(set_id)[variant_id].to_string(),
            notifications: std::mem::take(&mut *log.lock()),
        });
    }

    Ok(ActivationReport {
        steps,
        state: state_report(manager),
    })
}

/// Serialize a report, or format it as text
pub fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Ron => {
            ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?
        }
    })
}

pub fn state_text(state: &[SetState]) -> String {
    state
        .iter()
        .map(|set| {
            let active = if set.active.is_empty() {
                "-".to_string()
            } else {
                set.active.join(", ")
            };
            format!("{}: {}\n", set.name, active)
        })
        .collect()
}

pub fn list_text(listing: &[SetListing]) -> String {
    let mut out = String::new();
    for set in listing {
        out.push_str(&format!("[{}] {}\n", set.id, set.name));
        for variant in &set.variants {
            let marker = if variant.active { '*' } else { ' ' };
            let default = if variant.default { " (default)" } else { "" };
            out.push_str(&format!(
                "  {} [{}] {}{}\n",
                marker, variant.id, variant.name, default
            ));
        }
    }
    out
}

pub fn activation_text(report: &ActivationReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        out.push_str(&format!("activate {} = {}\n", step.variant_set, step.variant));
        for notification in &step.notifications {
            match notification {
                Notification::StateChange {
                    variant_set,
                    active,
                } => out.push_str(&format!("  state  {}: {:?}\n", variant_set, active)),
                Notification::GlobalStateChange(state) => {
                    out.push_str(&format!("  global {:?}\n", state))
                }
            }
        }
    }
    out.push_str(&state_text(&report.state));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"(
        nodes: [(name: "spoiler", visible: false), (name: "body")],
        variant_sets: [
            (name: "Package", variants: [
                (name: "Base", nodes: [(node: "spoiler", visible: false)]),
                (name: "Sport", nodes: [(node: "spoiler", visible: true)]),
            ]),
            (name: "Spoiler", variants: [
                (name: "Off", nodes: [(node: "spoiler", visible: false)]),
                (name: "On", nodes: [(node: "spoiler", visible: true)]),
            ]),
        ],
    )"#;

    fn manager() -> VariantSetManager {
        SceneDescriptor::from_ron_str(SCENE)
            .unwrap()
            .build(BuildOptions::default())
            .unwrap()
            .manager
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("Paint=Blue").unwrap(), ("Paint", "Blue"));
        assert!(parse_target("Paint").is_err());
        assert!(parse_target("=Blue").is_err());
    }

    #[test]
    fn test_resolve_by_name_or_index() {
        let manager = manager();

        assert_eq!(resolve_target(&manager, "Spoiler", "On").unwrap(), (1, 1));
        assert_eq!(resolve_target(&manager, "1", "0").unwrap(), (1, 0));
        assert_eq!(
            resolve_target(&manager, "5", "0"),
            Err(VariantError::UnknownVariantSet("5".into()))
        );
        assert!(matches!(
            resolve_target(&manager, "Spoiler", "Maybe"),
            Err(VariantError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_activation_records_cascade() {
        let mut manager = manager();
        let report = run_activate(&mut manager, &["Package=Sport".to_string()]).unwrap();

        assert_eq!(report.steps.len(), 1);
        assert_eq!(
            report.steps[0].notifications,
            vec![
                Notification::StateChange {
                    variant_set: "Package".into(),
                    active: vec![1]
                },
                Notification::StateChange {
                    variant_set: "Spoiler".into(),
                    active: vec![1]
                },
                Notification::GlobalStateChange(vec![vec![1], vec![1]]),
            ]
        );
        assert_eq!(
            report.state[1],
            SetState {
                name: "Spoiler".into(),
                active: vec!["On".into()]
            }
        );
    }

    #[test]
    fn test_demo_scene() {
        let mut manager = SceneDescriptor::from_ron_str(include_str!("../../../demos/car.ron"))
            .unwrap()
            .build(BuildOptions {
                strict_defaults: true,
            })
            .unwrap()
            .manager;
        assert_eq!(manager.global_state(), &[vec![0], vec![0], vec![0], vec![0], vec![0]]);

        let targets = ["Package=Sport".to_string(), "Paint=Blue".to_string()];
        let report = run_activate(&mut manager, &targets).unwrap();

        // The sport body drops the paint mapping until a paint is picked again
        let first: Vec<&str> = report.steps[0]
            .notifications
            .iter()
            .filter_map(|n| match n {
                Notification::StateChange { variant_set, .. } => Some(variant_set.as_str()),
                Notification::GlobalStateChange(_) => None,
            })
            .collect();
        assert_eq!(first, vec!["Package", "Wheels", "Spoiler", "Paint"]);
        assert_eq!(manager.global_state(), &[vec![1], vec![1], vec![1], vec![1], vec![0]]);
    }

    #[test]
    fn test_state_text() {
        let text = state_text(&state_report(&manager()));
        assert_eq!(text, "Package: Base\nSpoiler: Off\n");
    }

    #[test]
    fn test_render_json() {
        let state = state_report(&manager());
        let json = render(OutputFormat::Json, &state, |s| state_text(s)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[1]["active"][0], "Off");
    }
}
