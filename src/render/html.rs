use crate::render::HeatmapReport;

/// Render a self-contained HTML heatmap (data embedded as JSON).
///
/// The template is filled with `replace` rather than `format!()` because the
/// JS uses `${x}` template literals.
pub fn render_heatmap_html(report: &HeatmapReport) -> anyhow::Result<String> {
    // A "</script>" inside a title must not close the script element.
    let json = serde_json::to_string(report)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>iosnoop heatmap</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  h1 { font-size: 18px; margin: 0; }
  .panel { padding: 12px 16px; }
  .panel h2 { font-size: 15px; margin: 0 0 6px 0; }
  .muted { color: #777; font-size: 12px; }
  .plot { display: flex; align-items: flex-start; gap: 12px; }
  canvas { border: 1px solid #ddd; }
  #tip { position: fixed; pointer-events: none; background: #222; color: #fff;
         font-size: 12px; padding: 4px 6px; border-radius: 4px; display: none; }
</style>
</head>
<body>
<header>
  <h1 id="title"></h1>
</header>
<div id="panels"></div>
<div id="tip"></div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const PALETTES = {
  reds: [103, 0, 13],
  blues: [8, 48, 107],
  greens: [0, 68, 27],
  greys: [0, 0, 0],
  oranges: [127, 39, 4],
  purples: [63, 0, 125],
};

const CELL_W = DATA.square ? 12 : 8;
const CELL_H = 12;
const MARGIN_LEFT = 70;
const MARGIN_BOTTOM = 60;
const X_TICK_EVERY = 10;

function color(count) {
  if (!count) return "rgb(255,255,255)";
  const top = PALETTES[DATA.colormap] || PALETTES.reds;
  const t = DATA.vmax > 0 ? Math.min(count / DATA.vmax, 1) : 1;
  const c = top.map(v => Math.round(255 + (v - 255) * (0.15 + 0.85 * t)));
  return `rgb(${c[0]},${c[1]},${c[2]})`;
}

function legend() {
  const c = document.createElement("canvas");
  c.width = 60;
  c.height = 200;
  const g = c.getContext("2d");
  for (let y = 0; y < 180; y++) {
    g.fillStyle = color(Math.max(1, DATA.vmax * (1 - y / 180)));
    g.fillRect(0, y + 10, 16, 1);
  }
  g.fillStyle = "#333";
  g.font = "11px sans-serif";
  g.fillText(String(DATA.vmax), 20, 16);
  g.fillText("0", 20, 190);
  return c;
}

function renderPanel(panel) {
  const rows = panel.counts.length;
  const cols = rows ? panel.counts[0].length : 0;

  const box = document.createElement("div");
  box.className = "panel";
  box.innerHTML = `<h2></h2><div class="muted">${panel.rows} rows</div>`;
  box.querySelector("h2").textContent = panel.title;

  const plot = document.createElement("div");
  plot.className = "plot";

  const canvas = document.createElement("canvas");
  canvas.width = MARGIN_LEFT + cols * CELL_W + 10;
  canvas.height = rows * CELL_H + MARGIN_BOTTOM + 10;
  const g = canvas.getContext("2d");

  // Row 0 (lowest latency) is drawn at the bottom.
  for (let r = 0; r < rows; r++) {
    const y = (rows - 1 - r) * CELL_H + 5;
    for (let c = 0; c < cols; c++) {
      g.fillStyle = color(panel.counts[r][c]);
      g.fillRect(MARGIN_LEFT + c * CELL_W, y, CELL_W, CELL_H);
    }
    g.fillStyle = "#333";
    g.font = "10px sans-serif";
    g.textAlign = "right";
    g.fillText(panel.y_ticks[r], MARGIN_LEFT - 4, y + CELL_H - 2);
  }

  g.textAlign = "left";
  for (let c = 0; c < cols; c += X_TICK_EVERY) {
    g.save();
    g.translate(MARGIN_LEFT + c * CELL_W + 2, rows * CELL_H + 10);
    g.rotate(Math.PI / 4);
    g.fillText(panel.x_ticks[c], 0, 0);
    g.restore();
  }

  g.save();
  g.translate(12, 5 + rows * CELL_H / 2);
  g.rotate(-Math.PI / 2);
  g.textAlign = "center";
  g.fillText(DATA.y_label, 0, 0);
  g.restore();

  const tip = document.getElementById("tip");
  canvas.addEventListener("mousemove", (e) => {
    const rect = canvas.getBoundingClientRect();
    const c = Math.floor((e.clientX - rect.left - MARGIN_LEFT) / CELL_W);
    const r = rows - 1 - Math.floor((e.clientY - rect.top - 5) / CELL_H);
    if (c < 0 || c >= cols || r < 0 || r >= rows) {
      tip.style.display = "none";
      return;
    }
    tip.textContent = `time ${panel.x_ticks[c]} | latency ${panel.y_ticks[r]} | count ${panel.counts[r][c]}`;
    tip.style.left = (e.clientX + 12) + "px";
    tip.style.top = (e.clientY + 12) + "px";
    tip.style.display = "block";
  });
  canvas.addEventListener("mouseleave", () => { tip.style.display = "none"; });

  plot.appendChild(canvas);
  plot.appendChild(legend());
  box.appendChild(plot);

  const xl = document.createElement("div");
  xl.className = "muted";
  xl.style.whiteSpace = "pre";
  xl.textContent = DATA.x_label;
  box.appendChild(xl);
  return box;
}

document.getElementById("title").textContent = DATA.title;
const container = document.getElementById("panels");
for (const p of DATA.panels) container.appendChild(renderPanel(p));
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
