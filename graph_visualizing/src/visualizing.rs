// graph_visualizing/src/visualizing.rs
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use serde::Deserialize;

use graph_layout::LayoutConfig;
use models::assessment::AssessmentMetrics;
use models::counterfactuals::Counterfactuals;
use models::graph::{CombinedGraph, Graph};
use models::links::{Link, Relationship};
use models::nodes::{NodeType, SourceTag};

use crate::events::{Dispatcher, InteractionEvent};

/// Top-level wrapper for a serialized analysis result
#[derive(Deserialize, Debug)]
pub struct AnalysisJson {
    pub combined_graph: Graph,
    #[serde(default)]
    pub assessment: Option<AssessmentMetrics>,
    #[serde(default)]
    pub counterfactuals: Option<Counterfactuals>,
}

pub fn visualize_analysis_from_json(json_str: &str) -> Result<(), Box<dyn std::error::Error>> {
    let analysis: AnalysisJson = serde_json::from_str(json_str)
        .map_err(|e| format!("Result is not a valid analysis structure: {}", e))?;
    let combined = CombinedGraph::try_from(analysis.combined_graph)?;
    visualize_graph(combined, analysis.assessment, analysis.counterfactuals)
}

fn type_color(node_type: &NodeType) -> Color {
    match node_type {
        NodeType::Disease => Color::Red,
        NodeType::Symptom => Color::Blue,
        NodeType::AgeGroup => Color::Green,
        NodeType::Gender => Color::Magenta,
        NodeType::BloodPressure => Color::Yellow,
        NodeType::CholesterolLevel => Color::LightYellow,
        NodeType::Other(_) => Color::White,
    }
}

fn relationship_color(relationship: &Relationship) -> Color {
    match relationship {
        Relationship::HasSymptom => Color::Blue,
        Relationship::DoesNotHaveSymptom => Color::Red,
        Relationship::CommonIn => Color::Green,
        Relationship::PrevalentIn => Color::Magenta,
        Relationship::AssociatedWith => Color::Yellow,
        Relationship::CorrelatedWith => Color::Gray,
        Relationship::Other(_) => Color::White,
    }
}

fn source_color(source: SourceTag) -> Color {
    match source {
        SourceTag::GroundTruth => Color::Blue,
        SourceTag::Prediction => Color::Green,
        SourceTag::Both => Color::Magenta,
    }
}

// Novel factors always stand out in pink regardless of type
const NOVELTY_COLOR: Color = Color::LightMagenta;

fn link_color(link: &Link) -> Color {
    if link.is_novel {
        NOVELTY_COLOR
    } else {
        relationship_color(&link.relationship)
    }
}

fn source_text(source: Option<SourceTag>) -> &'static str {
    match source {
        Some(SourceTag::Both) => "Appears in both ground truth and prediction",
        Some(SourceTag::GroundTruth) => "Only appears in ground truth",
        Some(SourceTag::Prediction) => "Only appears in prediction",
        None => "Unattributed",
    }
}

/// Interactive terminal view of a combined graph.
///
/// Tab / BackTab cycle the selection through the nodes (the keyboard
/// stand-in for clicking), `r` resets it, WASD pans, `q` quits. Elements
/// outside the selected neighborhood are dimmed, never removed, and the
/// side panel shows the selected node's relationship summary next to the
/// assessment metrics.
pub fn visualize_graph(
    combined: CombinedGraph,
    metrics: Option<AssessmentMetrics>,
    counterfactuals: Option<Counterfactuals>,
) -> Result<(), Box<dyn std::error::Error>> {
    if combined.nodes.is_empty() {
        println!("Graph is empty — nothing to visualize.");
        return Ok(());
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let config = LayoutConfig::default();
    let mut dispatcher = Dispatcher::new(combined, config.clone());

    let mut offset_x = 0i16;
    let mut offset_y = 0i16;
    let mut cursor: Option<usize> = None;
    let mut running = true;

    while running {
        dispatcher.tick();
        let state = dispatcher.render_state();

        terminal.draw(|frame| {
            let area = frame.area();
            if area.width < 10 || area.height < 5 {
                return;
            }

            let panel_width = 42u16.min(area.width / 2);
            let graph_area = Rect {
                x: 0,
                y: 0,
                width: area.width - panel_width,
                height: area.height,
            };
            let panel_area = Rect {
                x: area.width - panel_width,
                y: 0,
                width: panel_width,
                height: area.height,
            };

            frame.render_widget(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Knowledge Graph - Tab: select | R: reset | WASD: pan | Q: quit"),
                graph_area,
            );

            let inner = Rect {
                x: graph_area.x + 1,
                y: graph_area.y + 1,
                width: graph_area.width.saturating_sub(2),
                height: graph_area.height.saturating_sub(2),
            };

            let graph = dispatcher.graph();
            let project = |gx: f64, gy: f64| -> (i32, i32) {
                let px = gx / config.width * (inner.width.saturating_sub(1)) as f64;
                let py = gy / config.height * (inner.height.saturating_sub(1)) as f64;
                (
                    inner.x as i32 + px.round() as i32 + offset_x as i32,
                    inner.y as i32 + py.round() as i32 + offset_y as i32,
                )
            };
            let in_bounds = |x: i32, y: i32| -> bool {
                x >= inner.x as i32
                    && x < (inner.x + inner.width) as i32
                    && y >= inner.y as i32
                    && y < (inner.y + inner.height) as i32
            };

            // Draw links first so node markers paint over them
            for (pos, link) in graph.links.iter().enumerate() {
                let (Some(src), Some(tgt)) = (graph.node(&link.source), graph.node(&link.target))
                else {
                    continue;
                };
                let (Some(sx), Some(sy), Some(tx), Some(ty)) = (src.x, src.y, tgt.x, tgt.y) else {
                    continue;
                };
                let (x1, y1) = project(sx, sy);
                let (x2, y2) = project(tx, ty);

                let style = state.links[pos];
                let mut line_style = Style::default().fg(link_color(link));
                if style.opacity < 1.0 {
                    line_style = line_style.add_modifier(Modifier::DIM);
                }
                let glyph = if style.width >= 2.0 { "•" } else { "·" };

                let steps = (x2 - x1).abs().max((y2 - y1).abs()).max(1);
                for step in 1..steps {
                    let t = step as f64 / steps as f64;
                    let x = x1 + ((x2 - x1) as f64 * t).round() as i32;
                    let y = y1 + ((y2 - y1) as f64 * t).round() as i32;
                    if in_bounds(x, y) {
                        frame.render_widget(
                            Paragraph::new(glyph).style(line_style),
                            Rect::new(x as u16, y as u16, 1, 1),
                        );
                    }
                }
            }

            // Draw nodes with their labels
            for (pos, node) in graph.nodes.iter().enumerate() {
                let (Some(nx), Some(ny)) = (node.x, node.y) else { continue };
                let (x, y) = project(nx, ny);
                if !in_bounds(x, y) {
                    continue;
                }

                let style = state.nodes[pos];
                let color = if node.is_novel { NOVELTY_COLOR } else { type_color(&node.node_type) };
                let mut node_style = Style::default().fg(color);
                if style.emphasized {
                    node_style = node_style.add_modifier(Modifier::BOLD);
                }
                if style.opacity < 1.0 {
                    node_style = node_style.add_modifier(Modifier::DIM);
                }

                let marker = if style.radius_scale > 1.0 { "◎" } else { "●" };
                let mut label = node.id.clone();
                if label.len() > 15 {
                    label.truncate(14);
                    label.push('…');
                }
                let text = format!("{} {}", marker, label);
                let width = (text.chars().count() as u16).min(inner.width);
                if (x as u16) + width <= inner.x + inner.width {
                    frame.render_widget(
                        Paragraph::new(text).style(node_style),
                        Rect::new(x as u16, y as u16, width, 1),
                    );
                }
            }

            render_info_panel(
                frame,
                panel_area,
                &dispatcher,
                metrics.as_ref(),
                counterfactuals.as_ref(),
            );
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => running = false,
                        KeyCode::Char('w') => offset_y = offset_y.saturating_add(2),
                        KeyCode::Char('s') => offset_y = offset_y.saturating_sub(2),
                        KeyCode::Char('a') => offset_x = offset_x.saturating_add(2),
                        KeyCode::Char('d') => offset_x = offset_x.saturating_sub(2),
                        KeyCode::Tab => {
                            let count = dispatcher.graph().node_count();
                            let next = cursor.map(|c| (c + 1) % count).unwrap_or(0);
                            cursor = Some(next);
                            let id = dispatcher.graph().nodes[next].id.clone();
                            let _ = dispatcher.handle(InteractionEvent::NodeClicked(id));
                        }
                        KeyCode::BackTab => {
                            let count = dispatcher.graph().node_count();
                            let prev = cursor.map(|c| (c + count - 1) % count).unwrap_or(count - 1);
                            cursor = Some(prev);
                            let id = dispatcher.graph().nodes[prev].id.clone();
                            let _ = dispatcher.handle(InteractionEvent::NodeClicked(id));
                        }
                        KeyCode::Char('r') => {
                            cursor = None;
                            let _ = dispatcher.handle(InteractionEvent::SelectionReset);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn render_info_panel(
    frame: &mut Frame,
    area: Rect,
    dispatcher: &Dispatcher,
    metrics: Option<&AssessmentMetrics>,
    counterfactuals: Option<&Counterfactuals>,
) {
    let mut lines: Vec<Line> = Vec::new();

    match dispatcher.selection() {
        Some(selection) => {
            let graph = dispatcher.graph();
            if let Some(node) = graph.node(&selection.selected) {
                lines.push(Line::from(Span::styled(
                    format!("{} ({})", node.id, node.node_type),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    source_text(node.source),
                    Style::default().fg(node.source.map(source_color).unwrap_or(Color::White)),
                )));
                lines.push(Line::from(format!(
                    "Connected to {} entities with {} relationships",
                    selection.summary.connected_entities, selection.summary.relationship_count
                )));
                lines.push(Line::default());
            }

            for bucket in &selection.summary.buckets {
                let header = match bucket.source_graph {
                    SourceTag::Both => "Shared Relationships:",
                    SourceTag::GroundTruth => "Ground Truth Only:",
                    SourceTag::Prediction => "Prediction Only:",
                };
                lines.push(Line::from(Span::styled(
                    header,
                    Style::default()
                        .fg(source_color(bucket.source_graph))
                        .add_modifier(Modifier::BOLD),
                )));
                for group in &bucket.groups {
                    lines.push(Line::from(format!("  {}:", group.display_name())));
                    let entries = group
                        .entries
                        .iter()
                        .map(|e| format!("{} ({})", e.partner, e.weight_percent()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    lines.push(Line::from(Span::styled(
                        format!("    {}", entries),
                        Style::default().fg(Color::Gray),
                    )));
                }
            }
        }
        None => {
            lines.push(Line::from("No node selected"));
            lines.push(Line::from(Span::styled(
                "Tab cycles through nodes",
                Style::default().fg(Color::Gray),
            )));
        }
    }

    if let Some(m) = metrics {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Predicted: {}", m.predicted_disease),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!("Assessment: {} ({})", m.assessment, m.reliability)));
        lines.push(Line::from(format!(
            "Confidence {:.0}%  Reasoning {:.0}%",
            m.confidence_score * 100.0,
            m.reasoning_accuracy * 100.0
        )));
        lines.push(Line::from(format!(
            "Similarity {:.0}%  Coverage {:.0}%  Novelty {:.0}%",
            m.semantic_similarity * 100.0,
            m.factor_coverage * 100.0,
            m.novelty * 100.0
        )));
    }

    // Externally generated counterfactual text is shown verbatim.
    if let Some(minimal) = counterfactuals.and_then(|c| c.minimal_changes.as_ref()) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Alternative diagnosis:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for text_line in minimal.explanation.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Details")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_json_round_trips_into_a_combined_graph() {
        let json = r#"
        {
            "combined_graph": {
                "nodes": [
                    {"id": "Flu", "type": "Disease", "source": "both"},
                    {"id": "Fever", "type": "Symptom", "source": "both"},
                    {"id": "Nausea", "type": "Symptom", "source": "prediction", "is_novel": true}
                ],
                "links": [
                    {"source": "Flu", "target": "Fever", "relationship": "HAS_SYMPTOM",
                     "weight": 0.6, "source_graph": "both", "ground_truth_weight": 0.8},
                    {"source": "Flu", "target": "Nausea", "relationship": "HAS_SYMPTOM",
                     "weight": 0.5, "source_graph": "prediction", "is_novel": true}
                ]
            },
            "assessment": {
                "predicted_disease": "Flu",
                "reasoning_accuracy": 1.0,
                "semantic_similarity": 1.0,
                "factor_coverage": 1.0,
                "novelty": 0.5,
                "confidence_score": 1.0,
                "reliability": "HIGH",
                "assessment": "STRONG MATCH"
            },
            "counterfactuals": {
                "minimal_changes": {"explanation": "To change the diagnosis from Flu to Cold, remove Fever."},
                "alternatives": []
            }
        }
        "#;

        let analysis: AnalysisJson = serde_json::from_str(json).unwrap();
        let combined = CombinedGraph::try_from(analysis.combined_graph).unwrap();
        assert_eq!(combined.node_count(), 3);
        assert_eq!(combined.link_count(), 2);
        assert!(combined.node("Nausea").unwrap().is_novel);
        assert_eq!(analysis.assessment.unwrap().predicted_disease, "Flu");
        assert!(analysis.counterfactuals.unwrap().minimal_changes.is_some());
    }

    #[test]
    fn colors_are_defined_for_the_whole_vocabulary() {
        assert_eq!(type_color(&NodeType::Disease), Color::Red);
        assert_eq!(relationship_color(&Relationship::DoesNotHaveSymptom), Color::Red);
        assert_eq!(type_color(&NodeType::Other("Comorbidity".into())), Color::White);
    }
}
