//! Scrollable table containers and cell alignment

use super::{rewrite_fragment, ProcessPlugin};
use crate::component::ComponentState;
use crate::dom;
use crate::error::Result;
use crate::settings::Settings;

pub const NAME: &str = "tables";

const CONTAINER: &str = "table-container";

pub struct TablesPlugin {
    state: ComponentState,
}

impl Default for TablesPlugin {
    fn default() -> Self {
        TablesPlugin {
            state: ComponentState::new(NAME),
        }
    }
}

impl ProcessPlugin for TablesPlugin {
    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ComponentState {
        &mut self.state
    }

    fn description(&self) -> &str {
        "Wraps tables in scroll containers and inlines cell alignment"
    }

    fn transform(&self, html: &str, _settings: &Settings) -> Result<String> {
        rewrite_fragment(html, |root| {
            for table in dom::elements_by_tag(root, &["table"]) {
                let wrapped = dom::parent(&table)
                    .map(|parent| dom::has_class(&parent, CONTAINER))
                    .unwrap_or(false);
                if !wrapped {
                    let container = dom::create_element(
                        "section",
                        vec![("class", CONTAINER), ("style", "overflow-x: auto;")],
                    );
                    dom::insert_before(&table, &container)?;
                    dom::append_child(&container, &table);
                }

                for cell in dom::elements_by_tag(&table, &["th", "td"]) {
                    if let Some(align) = dom::get_attr(&cell, "align") {
                        dom::remove_attr(&cell, "align");
                        dom::append_style(&cell, &format!("text-align: {align};"));
                    }
                }
            }
            Ok(())
        })
    }
}
