//! Index value chart drawn with native Typst shapes.

use crate::domain::performance::PerformanceRecord;

const WIDTH: f64 = 500.0;
const HEIGHT: f64 = 200.0;
const PADDING: f64 = 40.0;

pub fn format_value_chart(performance: &[PerformanceRecord]) -> String {
    if performance.is_empty() {
        return "_No index data available._".to_string();
    }

    // The 1.0 base is always in range so the baseline can be drawn.
    let min_value = performance
        .iter()
        .map(|p| p.cumulative_value)
        .fold(1.0_f64, f64::min);
    let max_value = performance
        .iter()
        .map(|p| p.cumulative_value)
        .fold(1.0_f64, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let range = max_value - min_value;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if performance.len() > 1 {
        plot_width / (performance.len() - 1) as f64
    } else {
        0.0
    };
    let y_of = |value: f64| HEIGHT - PADDING - (value - min_value) * scale_y;

    let vertices: Vec<String> = performance
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = PADDING + i as f64 * scale_x;
            format!("({:.1}pt, {:.1}pt)", x, y_of(point.cumulative_value))
        })
        .collect();

    let first = performance[0].date;
    let last = performance[performance.len() - 1].date;

    format!(
        r#"#figure(
  box(
    width: {w:.0}pt,
    height: {h:.0}pt,
    fill: white,
    {{
      place(line(start: ({p:.0}pt, {p:.0}pt), end: ({p:.0}pt, {bottom:.0}pt)))
      place(line(start: ({p:.0}pt, {bottom:.0}pt), end: ({right:.0}pt, {bottom:.0}pt)))
      place(line(start: ({p:.0}pt, {base:.1}pt), end: ({right:.0}pt, {base:.1}pt), stroke: (paint: gray, dash: "dashed")))
      place(dx: 2pt, dy: {top_label:.0}pt, text(size: 7pt)[{max:.4}])
      place(dx: 2pt, dy: {bottom_label:.0}pt, text(size: 7pt)[{min:.4}])
      place(path(stroke: blue + 1pt, {vertices}))
    }}
  ),
  caption: [Index value from {first} to {last}],
)
"#,
        w = WIDTH,
        h = HEIGHT,
        p = PADDING,
        bottom = HEIGHT - PADDING,
        right = WIDTH - PADDING,
        base = y_of(1.0),
        top_label = PADDING - 10.0,
        bottom_label = HEIGHT - PADDING + 2.0,
        max = max_value,
        min = min_value,
        vertices = vertices.join(", "),
        first = first,
        last = last,
    )
}
