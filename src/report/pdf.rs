use crate::domain::models::{CultureScoreReport, OrgBranding, Team};
use anyhow::Result;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Rect, Rgb,
};
use std::io::Cursor;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
/// Content never descends into this strip; the footer pass owns it.
const FOOTER_ZONE: f32 = 22.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const BAR_MAX_SCORE: f64 = 5.0;
const BAR_WIDTH: f32 = 80.0;
const BAR_HEIGHT: f32 = 4.0;

const DEFAULT_LOGO: &[u8] = include_bytes!("../../assets/default-logo.png");

const INTRO_TEXT: &str = "This report provides an AI-powered analysis of your organization's \
cultural health based on employee survey responses. The insights and recommendations are \
generated using advanced analytics and machine learning algorithms to identify patterns and \
trends in employee feedback.";

const EXECUTIVE_SUMMARY: &str = "This analysis is based on employee survey responses and \
provides insights into company culture, team dynamics, and recommended actions for \
improvement. The scores are calculated on a scale of 1-5, where 5 represents the highest \
level of satisfaction.";

const DISCLAIMER: &str = "This report is generated using AI analysis of survey responses. \
Recommendations should be reviewed in context of your organization's specific needs and \
circumstances.";

/// Renders one report into PDF bytes. Content is laid out first across as
/// many pages as needed; footers with the final page count are retrofitted
/// in a second pass before serialization.
pub fn render_pdf(report: &CultureScoreReport, branding: &OrgBranding) -> Result<Vec<u8>> {
    render(report, branding).map(|(bytes, _)| bytes)
}

fn render(report: &CultureScoreReport, branding: &OrgBranding) -> Result<(Vec<u8>, usize)> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Culture Score Report", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
    };

    let mut layout = Layout {
        doc,
        fonts,
        pages: vec![(first_page, first_layer)],
        y: PAGE_HEIGHT - MARGIN,
    };

    draw_title_block(&mut layout, report, branding);
    draw_overview(&mut layout, report);
    draw_team_metrics(&mut layout, report);
    draw_action_items(&mut layout, report);
    layout.retrofit_footers();

    let page_count = layout.pages.len();
    let bytes = layout.doc.save_to_bytes()?;
    Ok((bytes, page_count))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

struct Layout {
    doc: PdfDocumentReference,
    fonts: Fonts,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    /// Cursor in mm from the bottom of the current page.
    y: f32,
}

impl Layout {
    fn current_layer(&self) -> PdfLayerReference {
        let (page, layer) = *self.pages.last().expect("at least one page");
        self.doc.get_page(page).get_layer(layer)
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        self.pages.push((page, layer));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < MARGIN + FOOTER_ZONE {
            self.new_page();
        }
    }

    fn advance(&mut self, gap: f32) {
        self.y -= gap;
    }

    fn line(&mut self, text: &str, size: f32, font: FontKind, indent: f32) {
        let height = line_height(size);
        self.ensure_space(height);
        self.y -= height;
        let layer = self.current_layer();
        layer.set_fill_color(black());
        layer.use_text(text, size, Mm(MARGIN + indent), Mm(self.y), self.font(font));
    }

    fn wrapped(&mut self, text: &str, size: f32, font: FontKind, indent: f32) {
        for line in wrap_text(text, max_chars(size, CONTENT_WIDTH - indent)) {
            self.line(&line, size, font, indent);
        }
    }

    fn centered(&mut self, text: &str, size: f32, font: FontKind) {
        let height = line_height(size);
        self.ensure_space(height);
        self.y -= height;
        let x = ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(MARGIN);
        let layer = self.current_layer();
        layer.set_fill_color(black());
        layer.use_text(text, size, Mm(x), Mm(self.y), self.font(font));
    }

    fn section_header(&mut self, title: &str) {
        self.ensure_space(16.0);
        self.advance(6.0);
        self.line(&format!(">> {title}"), 16.0, FontKind::Bold, 0.0);
        // Thin rule standing in for an underline.
        let layer = self.current_layer();
        layer.set_fill_color(black());
        let rule = Rect::new(
            Mm(MARGIN),
            Mm(self.y - 1.2),
            Mm(MARGIN + CONTENT_WIDTH),
            Mm(self.y - 0.8),
        )
        .with_mode(PaintMode::Fill);
        layer.add_rect(rule);
        self.advance(4.0);
    }

    /// Horizontal bar proportional to `value` on the 1-5 scale, with a light
    /// track showing the full range.
    fn score_bar(&mut self, label: &str, value: f64) {
        self.ensure_space(BAR_HEIGHT + 8.0);
        self.line(&format!("{label}: {value:.1}/5"), 11.0, FontKind::Regular, 4.0);
        self.y -= BAR_HEIGHT + 2.0;

        let filled = (value.clamp(0.0, BAR_MAX_SCORE) / BAR_MAX_SCORE) as f32 * BAR_WIDTH;
        let layer = self.current_layer();

        layer.set_fill_color(Color::Rgb(Rgb::new(0.88, 0.88, 0.88, None)));
        layer.add_rect(
            Rect::new(
                Mm(MARGIN + 4.0),
                Mm(self.y),
                Mm(MARGIN + 4.0 + BAR_WIDTH),
                Mm(self.y + BAR_HEIGHT),
            )
            .with_mode(PaintMode::Fill),
        );

        layer.set_fill_color(Color::Rgb(Rgb::new(0.13, 0.35, 0.62, None)));
        layer.add_rect(
            Rect::new(
                Mm(MARGIN + 4.0),
                Mm(self.y),
                Mm(MARGIN + 4.0 + filled),
                Mm(self.y + BAR_HEIGHT),
            )
            .with_mode(PaintMode::Fill),
        );
        self.advance(3.0);
    }

    /// Second pass: every finalized page gets a page counter and the AI
    /// disclaimer. Runs only after the total page count is known.
    fn retrofit_footers(&mut self) {
        let total = self.pages.len();
        for (index, (page, layer_index)) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(*page).get_layer(*layer_index);
            layer.set_fill_color(black());

            let counter = format!("Page {} of {}", index + 1, total);
            let x = ((PAGE_WIDTH - text_width(&counter, 10.0)) / 2.0).max(MARGIN);
            layer.use_text(counter, 10.0, Mm(x), Mm(14.0), &self.fonts.regular);

            let mut y = 10.0;
            for line in wrap_text(DISCLAIMER, max_chars(8.0, CONTENT_WIDTH)) {
                let x = ((PAGE_WIDTH - text_width(&line, 8.0)) / 2.0).max(MARGIN);
                layer.use_text(line, 8.0, Mm(x), Mm(y), &self.fonts.italic);
                y -= 3.2;
            }
        }
    }

    fn font(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Regular => &self.fonts.regular,
            FontKind::Bold => &self.fonts.bold,
            FontKind::Italic => &self.fonts.italic,
        }
    }
}

#[derive(Clone, Copy)]
enum FontKind {
    Regular,
    Bold,
    Italic,
}

fn draw_title_block(layout: &mut Layout, report: &CultureScoreReport, branding: &OrgBranding) {
    draw_logo(layout, branding);
    layout.advance(8.0);
    layout.centered("Culture Score Report", 24.0, FontKind::Bold);
    layout.advance(2.0);
    layout.centered(&branding.company_name, 13.0, FontKind::Regular);
    layout.advance(6.0);
    layout.wrapped(INTRO_TEXT, 12.0, FontKind::Regular, 0.0);
    layout.advance(2.0);
    layout.line(
        &format!(
            "Generated on: {}",
            report.last_updated.format("%Y-%m-%d %H:%M UTC")
        ),
        11.0,
        FontKind::Regular,
        0.0,
    );

    layout.section_header("Executive Summary");
    layout.wrapped(EXECUTIVE_SUMMARY, 11.0, FontKind::Regular, 0.0);
}

fn draw_logo(layout: &mut Layout, branding: &OrgBranding) {
    let bytes = branding
        .logo_path
        .as_deref()
        .and_then(|path| match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(path, error = %err, "custom logo unreadable, using default");
                None
            }
        });

    // Custom logo first, bundled default when missing or undecodable. A
    // broken logo never aborts report generation.
    let decoded = bytes
        .as_deref()
        .and_then(|b| decode_png(b).ok())
        .or_else(|| decode_png(DEFAULT_LOGO).ok());

    if let Some(image) = decoded {
        layout.advance(18.0);
        image.add_to_layer(
            layout.current_layer(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(Mm(layout.y)),
                dpi: Some(300.0),
                ..Default::default()
            },
        );
    }
}

fn decode_png(bytes: &[u8]) -> Result<Image> {
    let decoder = PngDecoder::new(Cursor::new(bytes))?;
    Ok(Image::try_from(decoder)?)
}

fn draw_overview(layout: &mut Layout, report: &CultureScoreReport) {
    layout.section_header("Company Overview");
    let overview = &report.company_overview;
    let metrics = [
        (
            "Total Employees",
            format!(
                "{}/{}",
                overview.employees_with_responses, overview.total_employees
            ),
        ),
        ("Response Rate", format!("{}%", overview.response_rate)),
        (
            "Average Satisfaction",
            format!("{:.1}/5", overview.average_satisfaction),
        ),
        (
            "Work-Life Balance",
            format!("{:.1}/5", overview.average_work_life_balance),
        ),
    ];
    for (label, value) in metrics {
        layout.line(&format!("{label}: {value}"), 11.0, FontKind::Regular, 2.0);
        layout.advance(1.0);
    }
}

fn draw_team_metrics(layout: &mut Layout, report: &CultureScoreReport) {
    if report.team_metrics.is_empty() {
        return;
    }
    layout.section_header("Team Metrics");
    for team in &report.team_metrics {
        layout.ensure_space(40.0);
        layout.line(
            &format!(">> {} Team", team_heading(&team.team)),
            14.0,
            FontKind::Bold,
            0.0,
        );
        layout.advance(1.0);
        layout.line(
            &format!("Team Size: {} members", team.total_count),
            11.0,
            FontKind::Regular,
            4.0,
        );
        layout.line(
            &format!(
                "Response Rate: {}% ({}/{} responded)",
                team.response_rate, team.responded_count, team.total_count
            ),
            11.0,
            FontKind::Regular,
            4.0,
        );
        layout.score_bar("Satisfaction", team.satisfaction);
        layout.score_bar("Work-Life Balance", team.work_life_balance);
        layout.advance(4.0);
    }
}

fn draw_action_items(layout: &mut Layout, report: &CultureScoreReport) {
    if report.action_items.is_empty() {
        return;
    }
    layout.section_header("Recommended Actions");
    for (index, item) in report.action_items.iter().enumerate() {
        layout.ensure_space(24.0);
        layout.line(
            &format!(
                "{}. {} Priority: {}",
                index + 1,
                item.priority.marker(),
                item.priority.display_name()
            ),
            12.0,
            FontKind::Bold,
            0.0,
        );
        layout.wrapped(&item.text, 11.0, FontKind::Regular, 6.0);
        if !item.tags.is_empty() {
            layout.line(
                &format!("Tags: {}", item.tags.join(", ")),
                10.0,
                FontKind::Italic,
                6.0,
            );
        }
        layout.advance(3.0);
    }
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// Canonical heading for known teams, first-letter capitalization for
/// anything else the model reported.
fn team_heading(team: &str) -> String {
    match Team::parse(&team.to_lowercase()) {
        Some(known) => known.display_name().to_string(),
        None => capitalize(team),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn line_height(size: f32) -> f32 {
    // pt to mm with a little leading.
    size * 0.3528 * 1.35
}

/// Builtin fonts carry no metrics; approximate Helvetica at ~0.5em average
/// glyph width. Good enough for wrapping and rough centering.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * 0.3528
}

fn max_chars(size: f32, width_mm: f32) -> usize {
    let per_char = size * 0.5 * 0.3528;
    ((width_mm / per_char) as usize).max(8)
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        ActionItem, CompanyOverview, Priority, TeamMetrics,
    };
    use chrono::Utc;

    fn sample_report(teams: Vec<TeamMetrics>, items: Vec<ActionItem>) -> CultureScoreReport {
        CultureScoreReport {
            company_overview: CompanyOverview {
                total_employees: 10,
                employees_with_responses: 5,
                response_rate: "50.0".to_string(),
                average_satisfaction: 4.1,
                average_work_life_balance: 3.6,
            },
            team_metrics: teams,
            action_items: items,
            ai_generated: true,
            last_updated: Utc::now(),
        }
    }

    fn branding() -> OrgBranding {
        OrgBranding {
            company_name: "Acme".to_string(),
            logo_path: None,
        }
    }

    #[test]
    fn test_empty_report_still_renders() {
        let bytes = render_pdf(&sample_report(vec![], vec![]), &branding()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_missing_logo_falls_back() {
        let branding = OrgBranding {
            company_name: "Acme".to_string(),
            logo_path: Some("/nonexistent/logo.png".to_string()),
        };
        let bytes = render_pdf(&sample_report(vec![], vec![]), &branding).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_long_report_paginates() {
        let teams: Vec<TeamMetrics> = ["tech", "sales", "product", "marketing"]
            .iter()
            .map(|name| TeamMetrics {
                team: name.to_string(),
                total_count: 8,
                responded_count: 6,
                response_rate: "75.0".to_string(),
                satisfaction: 3.9,
                work_life_balance: 3.2,
            })
            .collect();
        let items: Vec<ActionItem> = (0..5)
            .map(|i| ActionItem {
                text: format!(
                    "Recommendation {i}: invest in cross-team rituals, clarify ownership \
                     boundaries, and schedule recurring feedback sessions so concerns surface \
                     before they harden into attrition risk."
                ),
                tags: vec!["culture".to_string(), "retention".to_string()],
                priority: Priority::Medium,
            })
            .collect();

        let (bytes, pages) = render(&sample_report(teams, items), &branding()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // Four team blocks plus five long action items cannot fit one A4 page.
        assert!(pages >= 2, "expected pagination, got {pages} page(s)");
    }

    #[test]
    fn test_text_color_is_opaque_black() {
        match black() {
            Color::Rgb(rgb) => {
                assert_eq!((rgb.r, rgb.g, rgb.b), (0.0, 0.0, 0.0));
                assert!(rgb.icc_profile.is_none());
            }
            other => panic!("expected Rgb, got {other:?}"),
        }
    }

    #[test]
    fn test_team_heading_prefers_canonical_names() {
        assert_eq!(team_heading("tech"), "Tech");
        assert_eq!(team_heading("MARKETING"), "Marketing");
        // Model-invented teams still get a readable heading.
        assert_eq!(team_heading("design"), "Design");
        assert_eq!(team_heading(""), "");
    }

    #[test]
    fn test_wrap_text_respects_limit() {
        let lines = wrap_text("one two three four five six", 9);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
        assert_eq!(lines.join(" "), "one two three four five six");
    }
}
