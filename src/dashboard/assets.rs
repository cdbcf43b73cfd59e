// src/dashboard/assets.rs

//! Embedded dashboard page. The page polls `/api/processes` and renders one
//! card per worker with a restart button.

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>respawn</title>
  <link rel="stylesheet" href="/static/style.css">
</head>
<body>
  <header>
    <h1>respawn</h1>
    <span id="summary">loading...</span>
  </header>
  <main id="processes"></main>
  <script src="/static/script.js"></script>
</body>
</html>
"#;

const STYLE_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  margin: 0;
  background: #f4f5f7;
  color: #1d2330;
}
header {
  display: flex;
  align-items: baseline;
  gap: 1rem;
  padding: 1rem 2rem;
  background: #1d2330;
  color: #fff;
}
header h1 { margin: 0; font-size: 1.4rem; }
main {
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(320px, 1fr));
  gap: 1rem;
  padding: 1.5rem 2rem;
}
.card {
  background: #fff;
  border-radius: 6px;
  padding: 1rem;
  box-shadow: 0 1px 3px rgba(0, 0, 0, 0.12);
}
.card code { word-break: break-all; }
.card dl { display: grid; grid-template-columns: auto 1fr; gap: 0.2rem 1rem; }
.card dt { color: #6b7280; }
.status { font-weight: 600; text-transform: uppercase; font-size: 0.8rem; }
.status.running { color: #15803d; }
.status.starting { color: #b45309; }
.status.failed { color: #b91c1c; }
.status.stopped { color: #6b7280; }
button { margin-top: 0.5rem; cursor: pointer; }
"#;

const SCRIPT_JS: &str = r#"'use strict';

const REFRESH_MS = 2000;

function formatUptime(secs) {
  const s = Math.floor(secs);
  const h = Math.floor(s / 3600);
  const m = Math.floor((s % 3600) / 60);
  return `${h}h ${m}m ${s % 60}s`;
}

function text(tag, value, className) {
  const el = document.createElement(tag);
  el.textContent = value;
  if (className) el.className = className;
  return el;
}

function row(list, label, value) {
  list.appendChild(text('dt', label));
  list.appendChild(text('dd', value));
}

function render(processes) {
  const root = document.getElementById('processes');
  root.replaceChildren();
  const running = processes.filter((p) => p.stats.status === 'running').length;
  document.getElementById('summary').textContent =
    `${running} of ${processes.length} running`;

  for (const p of processes) {
    const card = document.createElement('section');
    card.className = 'card';
    card.appendChild(text('code', p.command));
    card.appendChild(text('div', p.stats.status, `status ${p.stats.status}`));

    const list = document.createElement('dl');
    row(list, 'pid', p.stats.pid ?? '-');
    row(list, 'uptime', formatUptime(p.stats.uptime_secs));
    row(list, 'restarts', p.stats.restart_count);
    row(list, 'exit failures', p.stats.failure_count);
    row(list, 'launch failures', p.stats.launch_failures);
    row(list, 'last failure', p.stats.last_failure ?? '-');
    card.appendChild(list);

    const button = text('button', 'Restart');
    button.addEventListener('click', () => restart(p.id));
    card.appendChild(button);
    root.appendChild(card);
  }
}

async function refresh() {
  try {
    const res = await fetch('/api/processes');
    if (res.ok) render(await res.json());
  } catch (err) {
    document.getElementById('summary').textContent = 'connection lost';
  }
}

async function restart(id) {
  await fetch(`/api/restart/${encodeURIComponent(id)}`, { method: 'POST' });
  refresh();
}

refresh();
setInterval(refresh, REFRESH_MS);
"#;

pub fn index_html() -> &'static str {
    INDEX_HTML
}

/// Look up an embedded static file by name, returning its content type and body.
pub fn static_file(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "style.css" => Some(("text/css; charset=utf-8", STYLE_CSS)),
        "script.js" => Some(("application/javascript; charset=utf-8", SCRIPT_JS)),
        _ => None,
    }
}
