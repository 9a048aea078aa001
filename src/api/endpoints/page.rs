//! `GET /`: the single-page upload form.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(ANALYZER_PAGE_HTML)
}

pub const ANALYZER_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Corpus Compass</title>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      background: #fafaf9; color: #1c1917;
      display: flex; flex-direction: column; align-items: center; padding: 32px 16px;
    }
    main { width: 100%; max-width: 720px; }
    h1 { font-size: 28px; margin-bottom: 4px; }
    h2 { font-size: 18px; margin: 24px 0 8px; }
    p, li { color: #57534e; font-size: 14px; line-height: 1.5; }
    label { display: block; font-weight: 600; margin: 16px 0 6px; }
    input[type=password], input[type=file] {
      width: 100%; padding: 10px; border: 1px solid #d6d3d1; border-radius: 8px;
      background: white; font-size: 14px;
    }
    .hint { font-size: 12px; margin-top: 4px; }
    .btn {
      margin-top: 20px; padding: 14px; width: 100%; border: none; border-radius: 10px;
      background: #3b5b8c; color: white; font-size: 16px; font-weight: 600; cursor: pointer;
    }
    .btn:disabled { opacity: 0.5; cursor: not-allowed; }
    #progress { display: none; width: 100%; height: 10px; margin-top: 16px; accent-color: #3b5b8c; }
    .status { margin-top: 16px; font-size: 14px; }
    .status.success { color: #16a34a; }
    .status.error { color: #dc2626; }
    .skipped { margin-top: 8px; padding-left: 20px; }
    #download { display: none; margin-top: 12px; font-weight: 600; color: #3b5b8c; }
    details { margin-top: 32px; border-top: 1px solid #e7e5e4; padding-top: 16px; }
    summary { cursor: pointer; font-weight: 600; }
    ol { padding-left: 20px; margin-top: 8px; }
  </style>
</head>
<body>
<main>
  <h1>🧭 Corpus Compass</h1>
  <p>Envie artigos científicos em PDF e receba uma planilha com o fichamento de cada um.</p>

  <label for="api-key">Chave de API do Google AI Studio</label>
  <input type="password" id="api-key" autocomplete="off" placeholder="Cole sua chave aqui">
  <p class="hint">Não tem uma chave? <a href="https://aistudio.google.com/app/apikey" target="_blank" rel="noopener">Obtenha uma gratuitamente</a>.</p>

  <label for="files">Artigos (PDF)</label>
  <input type="file" id="files" accept="application/pdf,.pdf" multiple>

  <button class="btn" id="analyze" disabled>Analisar Artigos</button>

  <progress id="progress" max="1" value="0"></progress>
  <div class="status" id="status"></div>
  <ul class="skipped" id="skipped"></ul>
  <a id="download" download="relatorio_fichamentos.xlsx">📥 Baixar Relatório em Excel</a>

  <details>
    <summary>Como Funciona</summary>
    <ol>
      <li>O texto de cada PDF é extraído localmente, página por página.</li>
      <li>O texto é enviado ao modelo Gemini junto com instruções para extrair título, autores, ano, resumo, palavras-chave, metodologia e área do conhecimento.</li>
      <li>A resposta do modelo é convertida em uma linha da planilha. Campos não encontrados aparecem como "Não encontrado".</li>
      <li>Artigos que não puderem ser lidos ou analisados são ignorados e listados abaixo do botão.</li>
    </ol>
    <p>Sua chave é usada apenas nesta requisição e não é armazenada.</p>
  </details>
</main>

<script>
  var keyInput = document.getElementById('api-key');
  var fileInput = document.getElementById('files');
  var button = document.getElementById('analyze');
  var statusEl = document.getElementById('status');
  var skippedEl = document.getElementById('skipped');
  var download = document.getElementById('download');
  var progressEl = document.getElementById('progress');

  function refresh() {
    button.disabled = !(keyInput.value.trim() && fileInput.files.length > 0);
  }
  keyInput.addEventListener('input', refresh);
  fileInput.addEventListener('change', refresh);

  function setStatus(text, kind) {
    statusEl.textContent = text;
    statusEl.className = 'status' + (kind ? ' ' + kind : '');
  }

  function showSkipped(list) {
    skippedEl.innerHTML = '';
    (list || []).forEach(function(item) {
      var li = document.createElement('li');
      var detail = item.reason && item.reason.detail ? ': ' + item.reason.detail : '';
      li.textContent = item.filename + ' (' + item.reason.kind + detail + ')';
      skippedEl.appendChild(li);
    });
  }

  function onStatus(data) {
    progressEl.value = data.fraction;
    if (data.type === 'Processing') {
      setStatus('Processando artigo ' + (data.index + 1) + '/' + data.total + ': ' + data.filename);
    }
  }

  function onFinished(data) {
    return fetch('/api/reports/' + encodeURIComponent(data.report_id))
      .then(function(resp) {
        if (!resp.ok) {
          return resp.json().then(function(body) { throw body.error; });
        }
        return resp.blob();
      })
      .then(function(blob) {
        download.href = URL.createObjectURL(blob);
        download.style.display = 'inline-block';
        var text = 'Análise concluída! ' + data.processed + ' artigo(s) processado(s)';
        if (data.skipped.length) text += ', ' + data.skipped.length + ' ignorado(s)';
        setStatus(text + '.', 'success');
        showSkipped(data.skipped);
      });
  }

  // Parses "event:"/"data:" blocks as they arrive; resolves with the final event.
  function readEvents(resp) {
    var reader = resp.body.getReader();
    var decoder = new TextDecoder();
    var buffer = '';
    var last = null;

    function handle(block) {
      var name = '', data = '';
      block.split('\n').forEach(function(line) {
        if (line.indexOf('event:') === 0) name = line.slice(6).trim();
        else if (line.indexOf('data:') === 0) data += line.slice(5).trim();
      });
      if (!data) return;
      var payload = JSON.parse(data);
      if (name === 'status') onStatus(payload);
      else last = { name: name, data: payload };
    }

    function pump() {
      return reader.read().then(function(chunk) {
        if (chunk.done) {
          if (buffer.trim()) handle(buffer);
          return last;
        }
        buffer += decoder.decode(chunk.value, { stream: true });
        var blocks = buffer.split('\n\n');
        buffer = blocks.pop();
        blocks.forEach(handle);
        return pump();
      });
    }
    return pump();
  }

  button.addEventListener('click', function() {
    var form = new FormData();
    form.append('api_key', keyInput.value.trim());
    for (var i = 0; i < fileInput.files.length; i++) {
      form.append('files', fileInput.files[i], fileInput.files[i].name);
    }

    button.disabled = true;
    download.style.display = 'none';
    showSkipped([]);
    progressEl.value = 0;
    progressEl.style.display = 'block';
    setStatus('Processando ' + fileInput.files.length + ' artigo(s)... isso pode levar alguns minutos.');

    fetch('/api/analyze/stream', { method: 'POST', body: form })
      .then(function(resp) {
        if (!resp.ok) {
          return resp.json().then(function(body) { throw body.error; });
        }
        return readEvents(resp);
      })
      .then(function(last) {
        if (!last) throw { message: 'A análise foi interrompida.' };
        if (last.name === 'failed') throw last.data;
        return onFinished(last.data);
      })
      .catch(function(err) {
        setStatus((err && err.message) || 'Falha na requisição.', 'error');
        showSkipped(err && err.skipped);
      })
      .then(refresh);
  });
</script>
</body>
</html>
"#;
