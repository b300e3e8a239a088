//! Turns free-form generated text into the fixed section mapping and the
//! renderable HTML body. Extraction is total: any input, including an empty
//! string, yields a mapping with all five keys populated.

use crate::models::{ReportContent, SectionKey, SectionToggles};
use chrono::{Datelike, Utc};
use std::collections::BTreeMap;

fn marker(key: SectionKey) -> String {
    format!("**{}**", key.title())
}

/// Splits generated text into named sections.
///
/// If the text carries bolded section titles, each section runs from its
/// marker to the next marker (or the end). Otherwise blank-line-separated
/// blocks are assigned positionally, left to right. Anything missing, and
/// any section toggled off, gets its placeholder.
pub fn split_sections(content: &str, toggles: &SectionToggles) -> ReportContent {
    let markers: Vec<(SectionKey, usize, usize)> = SectionKey::ORDER
        .iter()
        .filter_map(|&key| {
            let m = marker(key);
            content.find(&m).map(|start| (key, start, start + m.len()))
        })
        .collect();

    let mut sections = BTreeMap::new();

    if !markers.is_empty() {
        for key in SectionKey::ORDER {
            let text = if !toggles.enabled(key) {
                None
            } else {
                markers.iter().find(|(k, _, _)| *k == key).map(|&(_, _, body_start)| {
                    let end = markers
                        .iter()
                        .map(|&(_, start, _)| start)
                        .filter(|&start| start >= body_start)
                        .min()
                        .unwrap_or(content.len());
                    content[body_start..end].trim().to_string()
                })
            };
            sections.insert(key, section_or_placeholder(key, text));
        }
    } else {
        let blocks: Vec<&str> = content
            .split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect();
        for (i, key) in SectionKey::ORDER.into_iter().enumerate() {
            let text = if toggles.enabled(key) {
                blocks.get(i).map(|block| block.to_string())
            } else {
                None
            };
            sections.insert(key, section_or_placeholder(key, text));
        }
    }

    ReportContent { sections }
}

fn section_or_placeholder(key: SectionKey, text: Option<String>) -> String {
    match text {
        Some(t) if !t.is_empty() => t,
        _ => key.placeholder().to_string(),
    }
}

const REPORT_STYLE: &str = "\
body { font-family: Arial, sans-serif; color: #333; line-height: 1.6; margin: 0; background: #f4f4f4; }\n\
.container { width: 80%; max-width: 900px; margin: auto; background: #fff; padding: 20px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }\n\
header { background: #333; color: #fff; padding: 30px 0; text-align: center; }\n\
h2 { color: #333; border-bottom: 2px solid #77d42a; padding-bottom: 5px; }\n\
footer { text-align: center; padding: 20px; background: #333; color: #fff; margin-top: 20px; }";

/// Merges the sections into the report document shell, in fixed order.
pub fn render_report_html(client_name: &str, industry: &str, content: &ReportContent) -> String {
    let mut body = String::new();
    for key in SectionKey::ORDER {
        body.push_str(&format!(
            "        <h2>{}</h2>\n        <p>{}</p>\n",
            key.title(),
            content.section(key)
        ));
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>AI Insights Report</title>\n<style>\n{REPORT_STYLE}\n</style>\n</head>\n<body>\n\
         <header>\n        <h1>AI Insights Report</h1>\n        <p>Prepared for {client_name} &mdash; {industry}</p>\n</header>\n\
         <div class=\"container\">\n{body}</div>\n\
         <footer>\n        <p>&copy; {} AI Consulting Services</p>\n</footer>\n</body>\n</html>\n",
        Utc::now().year()
    )
}

/// Plain-text rendition used for document archives and the local PDF layout.
pub fn render_report_text(content: &ReportContent) -> String {
    let mut out = String::from("AI Insights Report\n");
    for key in SectionKey::ORDER {
        out.push_str(&format!("\n{}\n{}\n", key.title(), content.section(key)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_on() -> SectionToggles {
        SectionToggles::default()
    }

    #[test]
    fn empty_input_yields_all_placeholders() {
        let content = split_sections("", &all_on());
        assert_eq!(content.sections.len(), 5);
        for key in SectionKey::ORDER {
            assert_eq!(content.section(key), key.placeholder());
        }
    }

    #[test]
    fn positional_blocks_fill_in_order() {
        let text = "intro text\n\ntrends text\n\nsolutions text\n\nanalysis text\n\nconclusion text";
        let content = split_sections(text, &all_on());
        assert_eq!(content.section(SectionKey::Introduction), "intro text");
        assert_eq!(content.section(SectionKey::IndustryTrends), "trends text");
        assert_eq!(content.section(SectionKey::Conclusion), "conclusion text");
    }

    #[test]
    fn positions_beyond_available_blocks_get_placeholders() {
        let content = split_sections("only intro\n\nonly trends", &all_on());
        assert_eq!(content.section(SectionKey::Introduction), "only intro");
        assert_eq!(content.section(SectionKey::IndustryTrends), "only trends");
        assert_eq!(
            content.section(SectionKey::AiSolutions),
            SectionKey::AiSolutions.placeholder()
        );
        assert_eq!(
            content.section(SectionKey::Conclusion),
            SectionKey::Conclusion.placeholder()
        );
    }

    #[test]
    fn markers_take_precedence_over_position() {
        let text = "preamble\n\n**Analysis** deep dive here\n\n**Introduction**\nwelcome";
        let content = split_sections(text, &all_on());
        assert_eq!(content.section(SectionKey::Analysis), "deep dive here");
        assert_eq!(content.section(SectionKey::Introduction), "welcome");
        // Markers present but these titles never appear
        assert_eq!(
            content.section(SectionKey::Conclusion),
            SectionKey::Conclusion.placeholder()
        );
    }

    #[test]
    fn marker_section_runs_until_next_marker() {
        let text = "**Introduction**\nfirst part\nsecond line\n**Industry Trends**\ntrends";
        let content = split_sections(text, &all_on());
        assert_eq!(content.section(SectionKey::Introduction), "first part\nsecond line");
        assert_eq!(content.section(SectionKey::IndustryTrends), "trends");
    }

    #[test]
    fn disabled_sections_get_placeholders_in_both_modes() {
        let toggles = SectionToggles {
            analysis: false,
            ..SectionToggles::default()
        };
        let positional = split_sections("a\n\nb\n\nc\n\nd\n\ne", &toggles);
        assert_eq!(
            positional.section(SectionKey::Analysis),
            SectionKey::Analysis.placeholder()
        );
        let marked = split_sections("**Analysis**\nshould be hidden", &toggles);
        assert_eq!(
            marked.section(SectionKey::Analysis),
            SectionKey::Analysis.placeholder()
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "**Introduction**\nhello\n\nstray block\n\n**Conclusion**\nbye";
        let first = split_sections(text, &all_on());
        let second = split_sections(text, &all_on());
        assert_eq!(first, second);
    }

    #[test]
    fn text_rendition_lists_sections_in_order() {
        let content = split_sections("intro\n\ntrends", &all_on());
        let text = render_report_text(&content);
        let intro = text.find("Introduction").unwrap();
        let trends = text.find("Industry Trends").unwrap();
        let conclusion = text.find("Conclusion").unwrap();
        assert!(intro < trends && trends < conclusion);
        assert!(text.contains(SectionKey::Analysis.placeholder()));
    }

    #[test]
    fn rendered_body_keeps_every_section_heading() {
        let content = split_sections("", &all_on());
        let html = render_report_html("John Doe", "Technology", &content);
        for key in SectionKey::ORDER {
            assert!(html.contains(&format!("<h2>{}</h2>", key.title())));
        }
        assert!(html.contains("Prepared for John Doe"));
    }
}
