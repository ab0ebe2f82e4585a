//! System prompt rendering.

use ollabot_core::provider::ToolDefinition;

/// Render the XML-structured system prompt.
///
/// With tools, a `<tools>` block lists each one as `name: description`.
pub fn system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(
        "<system>\n\
         <role>You are a helpful, concise assistant running on a local model.</role>\n\
         <guidelines>\n\
         <guideline>Answer directly and keep responses short.</guideline>\n\
         <guideline>Do not invent facts; say so when you are unsure.</guideline>\n",
    );

    if tools.is_empty() {
        prompt.push_str("</guidelines>\n");
    } else {
        prompt.push_str(
            "<guideline>Use a tool when it gives a more reliable answer than reasoning alone, \
             such as arithmetic, unit conversion, dates and text encoding.</guideline>\n\
             <guideline>A tool result starting with \"Error:\" means the call failed; \
             correct the arguments or answer without the tool.</guideline>\n\
             </guidelines>\n<tools>\n",
        );
        for tool in tools {
            prompt.push_str(&format!(
                "<tool>{}: {}</tool>\n",
                escape(&tool.name),
                escape(&tool.description)
            ));
        }
        prompt.push_str("</tools>\n");
    }

    prompt.push_str("</system>");
    prompt
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
