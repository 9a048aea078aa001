use crate::config::MAX_PROMPT_CHARS;

/// Instruction sent with every document. `{texto_documento}` is the single
/// substitution slot.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"
Sua tarefa é atuar como um pesquisador assistente e extrair dados estruturados de um artigo científico de qualquer área.
Analise o TEXTO DO ARTIGO fornecido e retorne um objeto JSON válido contendo as seguintes chaves:
- "titulo_artigo": (String) O título completo e exato do artigo.
- "autores": (Lista de Strings) Uma lista com os nomes de todos os autores.
- "ano_publicacao": (String) O ano de publicação do artigo.
- "resumo_ia": (String) Um resumo conciso do artigo em 3 a 4 frases, focando no problema, metodologia e conclusão.
- "palavras_chave_ia": (Lista de Strings) Uma lista com 5 a 10 palavras-chave ou frases-chave técnicas.
- "metodologia_principal": (String) Descreva de forma concisa (1 a 2 frases) a principal metodologia.
- "grande_area_conhecimento": (String) Identifique a grande área e o sub-campo do artigo (ex: 'Direito / Direito Penal', 'Biologia / Ornitologia').

TEXTO DO ARTIGO:
{texto_documento}

OBJETO JSON COM OS DADOS EXTRAÍDOS:
"#;

const TEXT_SLOT: &str = "{texto_documento}";

/// Build the extraction prompt for one document, truncating its text to
/// [`MAX_PROMPT_CHARS`] characters.
pub fn build_extraction_prompt(document_text: &str) -> String {
    build_extraction_prompt_with_limit(document_text, MAX_PROMPT_CHARS)
}

pub fn build_extraction_prompt_with_limit(document_text: &str, max_chars: usize) -> String {
    EXTRACTION_PROMPT_TEMPLATE.replacen(TEXT_SLOT, truncate_chars(document_text, max_chars), 1)
}

/// First `max_chars` characters of `s`, never splitting a UTF-8 sequence.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
