pub const DRAFT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions based on provided documents.";

pub const VERIFICATION_SYSTEM_PROMPT: &str =
    "You are a fact-checking auditor. Return only valid JSON.";

pub fn draft_prompt(context: &str, query: &str) -> String {
    format!(
        r#"You are a helpful assistant that answers questions based ONLY on the provided context chunks.

Instructions:
1. Answer the question using ONLY information from the context chunks below.
2. Do NOT use any external knowledge or make up information.
3. If the question cannot be answered from the context, explicitly state "I cannot answer this question based on the provided documents."
4. Be specific and reference the chunks when possible.

Context Chunks:
{context}

Question: {query}

Provide a clear, concise answer."#
    )
}

pub fn verification_prompt(chunks_summary: &str, answer: &str) -> String {
    format!(
        r#"You are a fact-checking auditor. Your job is to verify that claims in an answer are supported by the provided source chunks.

Instructions:
1. Carefully review each sentence of the answer.
2. Check if each claim is explicitly supported by the source chunks.
3. Mark unsupported claims as "UNSUPPORTED".
4. If a claim is contradicted by chunks, mark it as "CONTRADICTED".
5. Provide overall confidence: HIGH (fully supported), MEDIUM (mostly supported), or LOW (partially supported or contradicted).

Source Chunks:
{chunks_summary}

Answer to Verify:
{answer}

Respond with JSON in this exact format:
{{
  "supported_statements": ["statement 1", "statement 2"],
  "unsupported_statements": ["unsupported claim"],
  "contradicted_statements": ["contradicted claim"],
  "confidence_level": "HIGH|MEDIUM|LOW",
  "corrections": ["correction 1"],
  "explanation": "brief explanation"
}}"#
    )
}
