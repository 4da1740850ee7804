//! Driver program synthesis.
//!
//! The driver is a `Platform.worker` that imports every configured module,
//! renders each requested view to a string and sends all results out through
//! a single port during `init`.

use std::collections::HashSet;

use minijinja::{context, Environment};

use elm_static_config::{ModuleConfig, DRIVER_MODULE_NAME};

use crate::CodegenError;

/// Marker returned by the driver's serializer stub; swapped for a real
/// `JSON.stringify` call once the driver is compiled.
pub const SERIALIZE_PLACEHOLDER: &str = "REPLACE_ME_WITH_JSON_STRINGIFY";

/// Name of the port carrying the rendered pairs.
pub const OUTPUT_PORT: &str = "htmlOut";

const TEMPLATE_NAME: &str = "PrivateMain.elm";

/// Options passed to `nodeToStringWithOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Put child nodes on their own lines
    pub new_lines: bool,

    /// Indent width in spaces
    pub indent: u8,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            new_lines: true,
            indent: 4,
        }
    }
}

/// Renders driver program source from module descriptors.
pub struct DriverSynthesizer {
    env: Environment<'static>,
    options: FormatOptions,
}

impl DriverSynthesizer {
    /// Create a synthesizer with the default format options.
    pub fn new() -> Self {
        Self::with_options(FormatOptions::default())
    }

    /// Create a synthesizer with custom format options.
    pub fn with_options(options: FormatOptions) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_template_owned(TEMPLATE_NAME.to_string(), DRIVER_TEMPLATE.to_string())
            .expect("Failed to add driver template");

        Self { env, options }
    }

    /// Generate the driver source for `modules`.
    ///
    /// Imports follow module order; view pairs follow module order, then job
    /// order within each module.
    pub fn synthesize(&self, modules: &[ModuleConfig]) -> Result<String, CodegenError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;

        let source = template.render(context! {
            driver_module => DRIVER_MODULE_NAME,
            imports => import_lines(modules),
            views => view_pairs(modules),
            placeholder => SERIALIZE_PLACEHOLDER,
            new_lines => if self.options.new_lines { "True" } else { "False" },
            indent => self.options.indent,
            port => OUTPUT_PORT,
        })?;

        Ok(source)
    }
}

impl Default for DriverSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct module names in discovery order.
fn import_lines(modules: &[ModuleConfig]) -> Vec<&str> {
    let mut seen = HashSet::new();

    modules
        .iter()
        .map(|m| m.module_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// One `decode ( "<output>", Module.view )` call per job.
///
/// Decoding each pair separately lets views with different message types
/// share the output list.
fn view_pairs(modules: &[ModuleConfig]) -> Vec<String> {
    modules
        .iter()
        .flat_map(|module| {
            module.jobs.iter().map(move |job| {
                format!(
                    "decode ( {}, {}.{} )",
                    elm_string(&job.output_key()),
                    module.module_name,
                    job.view_function
                )
            })
        })
        .collect()
}

/// Quote a string as an Elm string literal.
fn elm_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');

    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\u{{{:04X}}}", c as u32)),
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

const DRIVER_TEMPLATE: &str = r#"port module {{ driver_module }} exposing (..)

import Platform
import Html exposing (Html)
import ElmHtml.InternalTypes exposing (decodeElmHtml)
import ElmHtml.ToString exposing (nodeToStringWithOptions, defaultFormatOptions)
import Json.Decode as Json
{% for module in imports %}
import {{ module }}
{% endfor %}


asJsonString : Html msg -> String
asJsonString x =
    "{{ placeholder }}"


options =
    { defaultFormatOptions | newLines = {{ new_lines }}, indent = {{ indent }} }


decode : ( String, Html msg ) -> ( String, String )
decode ( output, view ) =
    case Json.decodeString (decodeElmHtml (\_ _ -> Json.succeed ())) (asJsonString view) of
        Err err ->
            ( output, Json.errorToString err )

        Ok node ->
            ( output, nodeToStringWithOptions options node )


main =
    Platform.worker
        { init = \() -> ( (), {{ port }} [ {{ views | join(", ") }} ] )
        , update = \_ model -> ( model, Cmd.none )
        , subscriptions = \_ -> Sub.none
        }


port {{ port }} : List ( String, String ) -> Cmd msg
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use elm_static_config::{Destination, RenderJob};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn module(name: &str, jobs: &[(&str, &str)]) -> ModuleConfig {
        ModuleConfig {
            filename: PathBuf::from(format!("{}.elm", name)),
            module_name: name.to_string(),
            jobs: jobs
                .iter()
                .map(|(output, view)| RenderJob::new(Destination::parse(output), *view))
                .collect(),
        }
    }

    #[test]
    fn imports_each_module_once_in_order() {
        let modules = vec![
            module("Home", &[("index.html", "view")]),
            module("About", &[("about.html", "view")]),
            module("Home", &[("::stdout", "other")]),
        ];

        let source = DriverSynthesizer::new().synthesize(&modules).unwrap();
        let imports: Vec<&str> = source
            .lines()
            .filter(|l| l.starts_with("import ") && !l.contains("exposing") && !l.contains(" as "))
            .collect();

        assert_eq!(imports, vec!["import Platform", "import Home", "import About"]);
    }

    #[test]
    fn emits_pairs_in_module_then_job_order() {
        let modules = vec![
            module("Home", &[("index.html", "view"), ("::stdout", "summary")]),
            module("About", &[("about.html", "page")]),
        ];

        let source = DriverSynthesizer::new().synthesize(&modules).unwrap();

        assert!(source.contains(
            r#"htmlOut [ decode ( "index.html", Home.view ), decode ( "::stdout", Home.summary ), decode ( "about.html", About.page ) ]"#
        ));
    }

    #[test]
    fn counts_imports_and_pairs() {
        let modules: Vec<_> = (0..3)
            .map(|i| {
                let name = format!("Page{}", i);
                ModuleConfig {
                    filename: PathBuf::from(format!("{}.elm", name)),
                    module_name: name,
                    jobs: vec![
                        RenderJob::new(Destination::Stdout, "a"),
                        RenderJob::new(Destination::Stdout, "b"),
                    ],
                }
            })
            .collect();

        let source = DriverSynthesizer::new().synthesize(&modules).unwrap();

        assert_eq!(source.matches("\nimport Page").count(), 3);
        assert_eq!(source.matches("decode ( \"::stdout\", Page").count(), 6);
    }

    #[test]
    fn empty_module_list_still_renders() {
        let source = DriverSynthesizer::new().synthesize(&[]).unwrap();

        assert!(source.starts_with("port module PrivateMain exposing (..)"));
        assert!(source.contains("htmlOut [  ]"));
        assert!(source.contains("import Json.Decode as Json\n\n\nasJsonString"));
    }

    #[test]
    fn embeds_placeholder_and_format_options() {
        let source = DriverSynthesizer::new().synthesize(&[]).unwrap();

        assert!(source.contains("\"REPLACE_ME_WITH_JSON_STRINGIFY\""));
        assert!(source.contains("newLines = True, indent = 4"));
        assert!(source.contains("port htmlOut : List ( String, String ) -> Cmd msg"));

        let compact = DriverSynthesizer::with_options(FormatOptions {
            new_lines: false,
            indent: 2,
        })
        .synthesize(&[])
        .unwrap();
        assert!(compact.contains("newLines = False, indent = 2"));
    }

    #[test]
    fn escapes_output_strings() {
        assert_eq!(elm_string(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(elm_string("a\tb\r\nc"), r#""a\tb\r\nc""#);
        assert_eq!(elm_string("bell\u{7}.html"), r#""bell\u{0007}.html""#);
        assert_eq!(elm_string("café.html"), r#""café.html""#);
    }
}
