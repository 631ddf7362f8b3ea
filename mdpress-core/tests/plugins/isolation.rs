use mdpress_core::component::ComponentState;
use mdpress_core::{PluginManager, PressError, ProcessPlugin, Result, Settings};

struct Exploding {
    state: ComponentState,
}

impl ProcessPlugin for Exploding {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "fails on any input"
    }

    fn transform(&self, _html: &str, _settings: &Settings) -> Result<String> {
        panic!("boom")
    }
}

const NESTED: &str = "<ul><li>a<ul><li>b</li></ul></li></ul>";

#[test]
fn disabled_plugin_is_an_identity_stage() {
    let mut plugins = PluginManager::with_defaults();
    plugins.set_enabled("lists", false).unwrap();
    let settings = Settings::default();

    let report = plugins.process_chain(&["lists"], NESTED, &settings);
    assert_eq!(report.html, NESTED);
    assert!(report.is_clean());

    let with_disabled = plugins.process_chain(&["headings", "lists", "tables"], NESTED, &settings);
    let without = plugins.process_chain(&["headings", "tables"], NESTED, &settings);
    assert_eq!(with_disabled.html, without.html);
}

#[test]
fn a_panicking_plugin_does_not_stop_the_chain() {
    let mut plugins = PluginManager::with_defaults();
    plugins
        .register(Box::new(Exploding {
            state: ComponentState::new("exploding"),
        }))
        .unwrap();

    let report = plugins.process_chain(&["exploding", "lists"], NESTED, &Settings::default());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].plugin, "exploding");
    assert_eq!(
        report.failures[0].error,
        PressError::plugin("exploding", "panicked: boom")
    );
    assert!(report.html.contains("list-paddingleft-2"));
}

#[test]
fn plugin_config_round_trips_through_settings() {
    let mut plugins = PluginManager::with_defaults();
    let mut settings = Settings::default();
    plugins.set_enabled("tables", false).unwrap();
    plugins.save_settings(&mut settings);

    let json = settings.to_json().unwrap();
    let restored = Settings::from_json(&json).unwrap();
    let mut fresh = PluginManager::with_defaults();
    fresh.load_settings(&restored);
    assert!(!fresh.plugin("tables").unwrap().is_enabled());
    assert!(fresh.plugin("lists").unwrap().is_enabled());
}
