//! Deterministic prompt assembly for grounded answers.

/// Fixed instruction constraining the model to the supplied context.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the \
provided context. Only use information from the context to answer. If the answer is not in the \
context, say you don't know.";

/// Concatenate the retrieved chunk texts (ranked order, blank-line separated)
/// with the user question. Byte-for-byte identical for identical inputs.
pub fn build_prompt(query: &str, context_chunks: &[String]) -> String {
    let context = context_chunks.join("\n\n");
    format!("Context: {context}\n\nQuestion: {query}\n\nAnswer:")
}
