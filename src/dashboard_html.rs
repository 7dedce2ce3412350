//! Browser page served at `/`. Kept as a `&'static str` so the binary has no
//! runtime asset lookups; it talks to the `/api/*` routes only.

pub const DASHBOARD_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Global Clubfoot Initiative Dashboard</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #2c3e50; }
    header { text-align: center; padding: 1rem; border-bottom: 2px solid #3498db; }
    main { display: flex; }
    aside { width: 240px; padding: 1rem; background: #f8f9fa; }
    section { flex: 1; padding: 1rem; }
    .kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
    .kpi { background: white; padding: 1rem; border-radius: 0.5rem; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    .kpi p { font-size: 24px; font-weight: bold; margin: 0.5rem 0; }
    #map { height: 600px; margin-top: 1rem; }
    .charts { display: grid; grid-template-columns: repeat(2, 1fr); gap: 1rem; margin-top: 1rem; }
    .chart h4 { margin: 0.5rem 0; }
    .warning { color: #c0392b; }
  </style>
</head>
<body>
  <header>
    <h1>Global Clubfoot Initiative Dashboard</h1>
    <h3>Clinic Profiling and Analysis by Country</h3>
  </header>
  <main>
    <aside>
      <h2>Dashboard Controls</h2>
      <label>Select Country<br /><select id="country"><option>All Countries</option></select></label>
      <br /><br />
      <label>Coverage Radius (km): <span id="radius-value">50</span><br />
        <input id="radius" type="range" min="10" max="200" step="10" value="50" />
      </label>
    </aside>
    <section>
      <div class="kpis">
        <div class="kpi"><h4>Total Clinics</h4><p id="total-clinics" style="color:#2980b9">-</p></div>
        <div class="kpi"><h4>Ponseti Treatment Clinics</h4><p id="treatment-clinics" style="color:#27ae60">-</p></div>
        <div class="kpi"><h4>Ponseti Coverage Rate</h4><p id="coverage-rate" style="color:#8e44ad">-</p>
          <small>Share of clinics offering treatment, weighted by their geographic spread</small></div>
        <div class="kpi"><h4>Total Patients</h4><p id="total-patients" style="color:#e67e22">-</p></div>
      </div>
      <p id="map-warning" class="warning"></p>
      <div id="map"></div>
      <div class="charts" id="charts"></div>
    </section>
  </main>
  <script>
    const map = L.map('map').setView([0, 20], 3);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);
    let control = null;
    let overlays = [];

    const q = (params) => new URLSearchParams(params).toString();
    const getJson = (path, params) => fetch(`${path}?${q(params)}`).then(r => r.json());

    function selection() {
      return {
        country: document.getElementById('country').value,
        radius: document.getElementById('radius').value,
      };
    }

    function drawLayer(layer) {
      return L.geoJSON(layer.features, {
        pointToLayer: (feature, latlng) => {
          const p = feature.properties;
          if (p.kind === 'coverage') {
            return L.circle(latlng, { radius: p.radius_m, color: p.color, opacity: 0.1, fillOpacity: 0.1 });
          }
          if (p.kind === 'patients') {
            return L.circleMarker(latlng, { radius: 3 + Math.log2(1 + p.weight), color: p.color, fillOpacity: 0.7 });
          }
          return L.circleMarker(latlng, { radius: 7, color: p.color, fillOpacity: 0.9 });
        },
        onEachFeature: (feature, l) => {
          if (feature.properties.popup) l.bindPopup(feature.properties.popup, { maxWidth: 300 });
        },
      });
    }

    const esc = v => String(v).replace(/[&<>"']/g, ch => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' })[ch]);

    function barChart(title, bars, color) {
      const max = Math.max(1, ...bars.map(b => b[1]));
      const w = 40, h = 160;
      const rects = bars.map((b, i) => {
        const bh = Math.round(b[1] / max * h);
        return `<rect x="${i * w + 4}" y="${h - bh}" width="${w - 8}" height="${bh}" fill="${color}"><title>${esc(b[0])}: ${b[1].toFixed(1)}</title></rect>`
          + `<text x="${i * w + w / 2}" y="${h + 12}" font-size="9" text-anchor="middle">${esc(b[0])}</text>`;
      }).join('');
      return `<div class="chart"><h4>${esc(title)}</h4><svg width="${Math.max(200, bars.length * w)}" height="${h + 16}">${rects}</svg></div>`;
    }

    async function refresh() {
      const sel = selection();
      document.getElementById('radius-value').textContent = sel.radius;

      const metrics = await getJson('/api/metrics', { country: sel.country });
      document.getElementById('total-clinics').textContent = metrics.total_clinics;
      document.getElementById('treatment-clinics').textContent = metrics.treatment_clinics;
      document.getElementById('coverage-rate').textContent = metrics.coverage_rate.toFixed(1) + '%';
      document.getElementById('total-patients').textContent = metrics.total_patients;

      overlays.forEach(l => map.removeLayer(l));
      if (control) map.removeControl(control);
      overlays = [];
      const coverage = await getJson('/api/map', sel);
      const warning = document.getElementById('map-warning');
      if (coverage) {
        warning.textContent = '';
        const named = {};
        coverage.layers.forEach(layer => {
          const l = drawLayer(layer).addTo(map);
          overlays.push(l);
          named[layer.name] = l;
        });
        control = L.control.layers(null, named, { position: 'topright' }).addTo(map);
        map.setView(coverage.center, coverage.zoom);
      } else {
        warning.textContent = 'No clinics found for the selected filters.';
      }

      const dist = await getJson('/api/distribution', { country: sel.country });
      const treat = await getJson('/api/treatment', { country: sel.country });
      document.getElementById('charts').innerHTML = [
        barChart('Number of Clinics by Country', dist.clinics_by_country.map(c => [c.label, c.count]), '#2980b9'),
        barChart('Ponseti Treatment Availability', dist.availability.map(c => [c.label, c.count]), '#27ae60'),
        barChart('Treatment Completion Rate Over Time (2 Years FAB)', treat.completion_rate_by_year.map(y => [y.year, y.value]), '#8e44ad'),
        barChart('Age Distribution of Patients', treat.age_distribution.map(b => [b.band, b.count]), '#e67e22'),
        barChart('Treatment Progress Stages', treat.stages.map(s => [s.label, s.value]), '#16a085'),
        barChart('Treatment Coverage Rate by Year', treat.coverage_by_year.map(y => [y.year, y.value]), '#c0392b'),
      ].join('');
    }

    async function init() {
      const countries = await fetch('/api/countries').then(r => r.json());
      const select = document.getElementById('country');
      countries.forEach(c => select.add(new Option(c, c)));
      select.addEventListener('change', refresh);
      document.getElementById('radius').addEventListener('change', refresh);
      refresh();
    }
    init();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_labels_and_titles_are_escaped() {
        assert!(DASHBOARD_HTML.contains("const esc = "));
        assert!(DASHBOARD_HTML.contains("<h4>${esc(title)}</h4>"));
        assert_eq!(DASHBOARD_HTML.matches("${esc(b[0])}").count(), 2);
        assert!(!DASHBOARD_HTML.contains("${b[0]}"));
        assert!(!DASHBOARD_HTML.contains("<h4>${title}</h4>"));
    }
}
