//! SVG renderer: converts connection lines into a fixed overlay document.

use crate::views::connections::ConnectionLine;

/// Render `lines` as an SVG overlay covering the viewport.
///
/// `width` and `height` are the viewport size. Highlighted lines are drawn
/// three pixels wide and tagged with the `highlighted` class.
pub fn render_connections(lines: &[ConnectionLine], width: f64, height: f64) -> String {
    let mut svg = String::with_capacity(lines.len() * 160 + 200);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="connection-svg" viewBox="0 0 {width} {height}" width="100%" height="100%" style="position:fixed;inset:0;pointer-events:none;z-index:1">"#,
    ));

    for line in lines {
        let (class, stroke_width) = if line.highlighted {
            ("connection-line highlighted", 3)
        } else {
            ("connection-line", 1)
        };
        svg.push_str(&format!(
            r#"<path id="{}" d="{}" class="{class}" fill="none" stroke-width="{stroke_width}" data-tech="{}"/>"#,
            escape_xml(&line.id),
            line.path().to_svg_d(),
            escape_xml(&line.tech),
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_protocol::Point;

    fn line(id: &str, tech: &str, highlighted: bool) -> ConnectionLine {
        ConnectionLine {
            id: id.into(),
            tech: tech.into(),
            start: Point::new(0.0, 0.0),
            end: Point::new(90.0, 30.0),
            highlighted,
        }
    }

    #[test]
    fn basic_svg_output() {
        let svg = render_connections(
            &[line("line-0-0-Go", "Go", false), line("line-1-0-Rust", "Rust", true)],
            800.0,
            600.0,
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"d="M0,0 C30,0 60,30 90,30""#));
        assert!(svg.contains(r#"class="connection-line" fill="none" stroke-width="1""#));
        assert!(svg.contains(r#"class="connection-line highlighted" fill="none" stroke-width="3""#));
    }

    #[test]
    fn empty_set_is_an_empty_overlay() {
        let svg = render_connections(&[], 10.0, 10.0);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn escapes_xml_entities() {
        let svg = render_connections(&[line("line-0-0-C<&>", "C<&>", false)], 10.0, 10.0);
        assert!(svg.contains("C&lt;&amp;&gt;"));
        assert!(!svg.contains("C<&>"));
    }
}
