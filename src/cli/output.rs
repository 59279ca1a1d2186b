//! Output formatting module
//!
//! This module handles writing a rendered graph in the supported output formats.

use crate::{Result, graph::Rendered};

/// Output the render summary, path and markdown as JSON
pub fn output_json(w: &mut impl std::io::Write, rendered: &Rendered) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, rendered)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Output the markdown as is
pub fn output_markdown(w: &mut impl std::io::Write, rendered: &Rendered) -> Result<()> {
    w.write_all(rendered.text.as_bytes())?;
    if !rendered.text.ends_with('\n') {
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStats;
    use std::path::PathBuf;

    fn create_test_render() -> Rendered {
        Rendered {
            text: "```mermaid\nflowchart TB\n\tA0[\"wallet\"]\n```\n".to_string(),
            stats: GraphStats {
                participants: 2,
                edges: 1,
                tables: 0,
                skipped: 3,
            },
            path: Some(PathBuf::from("graphs/trace.md")),
        }
    }

    #[test]
    fn test_output_json() {
        let mut output = Vec::new();
        output_json(&mut output, &create_test_render()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["summary"]["participants"], 2);
        assert_eq!(value["summary"]["edges"], 1);
        assert_eq!(value["summary"]["tables"], 0);
        assert_eq!(value["summary"]["skipped"], 3);
        assert_eq!(value["path"], "graphs/trace.md");
        assert!(value["markdown"].as_str().unwrap().starts_with("```mermaid"));
    }

    #[test]
    fn test_output_json_without_path() {
        let rendered = Rendered {
            path: None,
            ..create_test_render()
        };
        let mut output = Vec::new();
        output_json(&mut output, &rendered).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(value["path"].is_null());
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_output_markdown() {
        let rendered = create_test_render();
        let mut output = Vec::new();
        output_markdown(&mut output, &rendered).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), rendered.text);
    }
}
