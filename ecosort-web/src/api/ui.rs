//! UI routes - HTML pages for the ecosort-web interface
//!
//! Pages are plain HTML/CSS/JS rendered with `format!`; no template engine.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::upload::ALLOWED_EXTENSIONS;
use crate::AppState;

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }
        header {
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 20px;
            margin-bottom: 30px;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }
        header a { color: #4a9eff; margin-left: 15px; text-decoration: none; }
        h1 { font-size: 26px; color: #4a9eff; }
        h2 { color: #4a9eff; margin-bottom: 15px; }
        .content { padding: 0 20px 40px; }
        .button {
            display: inline-block;
            padding: 10px 20px;
            background: #4a9eff;
            color: white;
            border: none;
            text-decoration: none;
            border-radius: 4px;
            margin: 10px 5px;
            font-weight: 600;
            cursor: pointer;
        }
        .button:hover { background: #3a8eef; }
        .result { margin-top: 20px; padding: 15px; background: #2a2a2a; border-radius: 4px; }
        .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 20px; }
        .card { background: #2a2a2a; border: 1px solid #3a3a3a; border-radius: 6px; overflow: hidden; }
        .card img { width: 100%; height: 180px; object-fit: cover; }
        .card-body { padding: 10px; font-size: 14px; }
        .waste-type { font-weight: 700; margin-bottom: 6px; }
        .organic { color: #10b981; }
        .inorganic { color: #f59e0b; }
        .mixed { color: #a78bfa; }
        .pager { margin-top: 25px; display: flex; align-items: center; gap: 10px; }
        .empty { color: #888; }
        .build-info { color: #888; font-family: 'Courier New', monospace; font-size: 12px; }
"#;

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap page content in the shared layout
pub fn render_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>EcoSort - {title}</title>
    <style>{style}</style>
</head>
<body>
    <header>
        <h1>EcoSort</h1>
        <nav>
            <a href="/">Classify</a>
            <a href="/history">History</a>
        </nav>
        <div class="build-info">v{version} [{git_hash}]</div>
    </header>
    <div class="content">{body}
    </div>
</body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        body = body,
    )
}

const UPLOAD_SCRIPT: &str = r#"
    <script>
        const form = document.getElementById('upload-form');
        const output = document.getElementById('result');
        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            output.textContent = 'Analyzing...';
            try {
                const response = await fetch('/analyze', { method: 'POST', body: new FormData(form) });
                const data = await response.json();
                if (!response.ok) {
                    output.textContent = 'Error: ' + data.error.message;
                    return;
                }
                output.textContent = '';
                const result = document.createElement('div');
                result.innerHTML = '<strong>Result:</strong> ';
                result.append(data.result);
                const objects = document.createElement('div');
                objects.innerHTML = '<strong>Detected objects:</strong> ';
                objects.append(data.detected_objects);
                output.append(result, objects);
            } catch (err) {
                output.textContent = 'Error: ' + err;
            }
        });
    </script>"#;

/// GET /
///
/// Upload form; the result is fetched from POST /analyze
pub async fn root_page() -> impl IntoResponse {
    let accept: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| format!(".{}", e)).collect();

    let body = format!(
        r#"
    <h2>Classify waste from a photo</h2>
    <form id="upload-form" enctype="multipart/form-data">
        <input type="file" name="image" accept="{accept}" required>
        <button class="button" type="submit">Analyze</button>
    </form>
    <div id="result" class="result">Choose an image ({formats}).</div>
    {script}"#,
        accept = accept.join(","),
        formats = ALLOWED_EXTENSIONS.join(", "),
        script = UPLOAD_SCRIPT,
    );

    Html(render_page("Classify", &body))
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(root_page))
}
