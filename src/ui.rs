use crate::models::TodayResponse;

pub fn render_index(today: &TodayResponse) -> String {
    let initial = serde_json::to_string(today).unwrap_or_else(|_| "null".to_string());
    INDEX_HTML
        .replace("{{DATE}}", &today.date)
        .replace("{{INITIAL}}", &escape_script(&initial))
}

/// Keeps embedded JSON from closing the surrounding script tag.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Tap Counter</title>
  <style>
    :root {
      --paper: #f4f1ea;
      --ink: #22211f;
      --muted: #7a756c;
      --tap: #2e7d6b;
      --warn: #b4492f;
      --panel: #ffffff;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--paper);
      color: var(--ink);
      font-family: system-ui, "Segoe UI", sans-serif;
      display: flex;
      justify-content: center;
      padding: 24px 14px 40px;
    }

    main {
      width: min(720px, 100%);
      display: grid;
      gap: 20px;
    }

    header { display: flex; justify-content: space-between; align-items: baseline; gap: 12px; }
    h1 { margin: 0; font-size: 1.8rem; }
    .date { color: var(--muted); }

    section {
      background: var(--panel);
      border-radius: 16px;
      padding: 18px;
      box-shadow: 0 6px 18px rgba(34, 33, 31, 0.08);
      display: grid;
      gap: 12px;
    }

    .project {
      display: grid;
      grid-template-columns: 1fr auto auto auto;
      align-items: center;
      gap: 8px;
      padding: 10px;
      border-radius: 12px;
      border: 1px solid #e6e1d6;
    }

    .project.active { border-color: var(--tap); }
    .project .name { font-weight: 600; cursor: pointer; }
    .project .count { font-size: 1.6rem; font-variant-numeric: tabular-nums; min-width: 3ch; text-align: right; }

    button {
      border: none;
      border-radius: 10px;
      padding: 10px 14px;
      font-weight: 600;
      cursor: pointer;
      background: #ebe6dc;
      color: var(--ink);
    }

    button.tap { background: var(--tap); color: white; font-size: 1.1rem; }
    button.danger { background: var(--warn); color: white; }
    button:disabled { opacity: 0.4; cursor: default; }

    form { display: flex; gap: 8px; flex-wrap: wrap; }
    input { padding: 10px; border-radius: 10px; border: 1px solid #d8d2c5; font: inherit; }
    input[type="text"] { flex: 1; }

    table { width: 100%; border-collapse: collapse; }
    th, td { text-align: left; padding: 6px 4px; border-bottom: 1px solid #eee8dc; }
    td.num { text-align: right; font-variant-numeric: tabular-nums; }
    tr.podium td:first-child { font-weight: 700; color: var(--tap); }

    .day h3 { margin: 8px 0 4px; font-size: 1rem; }
    .day ul { margin: 0; padding-left: 18px; color: var(--muted); }
    .status { min-height: 1.2em; color: var(--muted); }
    .status.error { color: var(--warn); }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Tap Counter</h1>
      <span class="date" id="date">{{DATE}}</span>
    </header>

    <section>
      <div id="projects"></div>
      <form id="create-form">
        <input type="text" id="new-name" list="recent-names" placeholder="New project" autocomplete="off" />
        <datalist id="recent-names"></datalist>
        <button type="submit">Add</button>
      </form>
      <form>
        <button type="button" id="undo">Undo</button>
        <button type="button" id="redo">Redo</button>
      </form>
      <div class="status" id="status"></div>
    </section>

    <section>
      <form id="stats-form">
        <label for="stats-start">Stats since</label>
        <input type="date" id="stats-start" />
      </form>
      <table>
        <thead><tr><th>#</th><th>Project</th><th>Total</th><th>Days</th><th>Avg</th></tr></thead>
        <tbody id="aggregate"></tbody>
      </table>
      <div id="history"></div>
    </section>

    <section>
      <form>
        <button type="button" class="danger" id="factory-reset">Factory reset</button>
      </form>
    </section>
  </main>

  <script>
    let today = {{INITIAL}};

    const statusEl = document.getElementById('status');
    const setStatus = (message, tone) => {
      statusEl.textContent = message;
      statusEl.className = tone ? `status ${tone}` : 'status';
    };

    const request = async (method, url, body) => {
      const options = { method, headers: {} };
      if (body !== undefined) {
        options.headers['content-type'] = 'application/json';
        options.body = JSON.stringify(body);
      }
      const res = await fetch(url, options);
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.json();
    };

    const el = (tag, attrs = {}, text) => {
      const node = document.createElement(tag);
      Object.entries(attrs).forEach(([key, value]) => node.setAttribute(key, value));
      if (text !== undefined) node.textContent = text;
      return node;
    };

    const renderToday = () => {
      document.getElementById('date').textContent = today.date;
      const list = document.getElementById('projects');
      list.replaceChildren();
      today.projects.forEach((project) => {
        const row = el('div', { class: project.active ? 'project active' : 'project' });
        const name = el('span', { class: 'name', title: 'Select' }, project.name);
        name.addEventListener('click', () => mutate('POST', `/api/projects/${project.id}/select`));
        const count = el('span', { class: 'count' }, String(project.count));
        const tap = el('button', { class: 'tap' }, '+1');
        tap.addEventListener('click', () => mutate('POST', `/api/projects/${project.id}/increment`));
        const reset = el('button', {}, 'Reset');
        reset.addEventListener('click', () => mutate('POST', `/api/projects/${project.id}/reset`));
        const remove = el('button', {}, 'Delete');
        remove.addEventListener('click', () => removeProject(project));
        row.append(name, count, tap, reset, remove);
        list.append(row);
      });

      const recent = document.getElementById('recent-names');
      recent.replaceChildren(...today.recent_names.map((name) => el('option', { value: name })));
      document.getElementById('undo').disabled = !today.can_undo;
      document.getElementById('redo').disabled = !today.can_redo;
    };

    const renderStats = (stats) => {
      document.getElementById('stats-start').value = stats.start_date;
      const body = document.getElementById('aggregate');
      body.replaceChildren(...stats.aggregate.map((row) => {
        const tr = el('tr', { class: row.podium ? 'podium' : '' });
        tr.append(
          el('td', {}, String(row.rank)),
          el('td', {}, row.name),
          el('td', { class: 'num' }, String(row.total)),
          el('td', { class: 'num' }, String(row.occurrences)),
          el('td', { class: 'num' }, row.average)
        );
        return tr;
      }));

      const history = document.getElementById('history');
      history.replaceChildren(...stats.history.map((day) => {
        const block = el('div', { class: 'day' });
        block.append(el('h3', {}, `${day.date} (${day.total})`));
        const items = el('ul');
        day.entries.forEach((entry) => items.append(el('li', {}, `${entry.name}: ${entry.count}`)));
        block.append(items);
        return block;
      }));
    };

    const loadStats = async () => renderStats(await request('GET', '/api/stats'));

    const mutate = async (method, url, body) => {
      try {
        today = await request(method, url, body);
        renderToday();
        await loadStats();
        setStatus('', '');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    };

    const removeProject = async (project) => {
      if (!confirm(`Delete "${project.name}"? Projects with history are archived.`)) return;
      try {
        const result = await request('DELETE', `/api/projects/${project.id}`);
        today = result.today;
        renderToday();
        await loadStats();
        setStatus(result.outcome === 'archived' ? 'Archived, re-add the name to restore it' : 'Deleted', '');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    };

    document.getElementById('create-form').addEventListener('submit', (event) => {
      event.preventDefault();
      const input = document.getElementById('new-name');
      const name = input.value.trim();
      if (!name) return;
      input.value = '';
      mutate('POST', '/api/projects', { name });
    });

    document.getElementById('undo').addEventListener('click', () => mutate('POST', '/api/undo'));
    document.getElementById('redo').addEventListener('click', () => mutate('POST', '/api/redo'));

    document.getElementById('stats-start').addEventListener('change', async (event) => {
      try {
        renderStats(await request('PUT', '/api/stats/start', { start_date: event.target.value }));
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('factory-reset').addEventListener('click', () => {
      if (confirm('Erase every project and all history?')) {
        mutate('POST', '/api/factory-reset');
      }
    });

    if (today) renderToday();
    request('GET', '/api/today')
      .then((fresh) => { today = fresh; renderToday(); })
      .then(loadStats)
      .catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
