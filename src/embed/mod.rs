//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (hotreload.js)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotreload.js.
    pub struct HotreloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for HotreloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__KILN_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Live-reload client with WebSocket port injection.
    pub const HOTRELOAD_JS: Template<HotreloadVars> =
        Template::new(include_str!("serve/hotreload.js"));

    /// Inline `<script>` tag injected into served HTML.
    pub fn hotreload_tag(ws_port: u16) -> String {
        format!("<script>{}</script>", HOTRELOAD_JS.render(&HotreloadVars { ws_port }))
    }
}
