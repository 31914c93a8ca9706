//! Frame scoping for steps recorded inside an embedded document

/// Wrap instructions so they run against the body of the `index`-th iframe
pub fn wrap_in_frame(index: usize, lines: Vec<String>) -> Vec<String> {
    let mut wrapped = Vec::with_capacity(lines.len() + 2);
    wrapped.push(format!(
        "cy.get('iframe').eq({}).its('0.contentDocument.body').should('not.be.empty').then(cy.wrap).within(() => {{",
        index
    ));
    wrapped.extend(lines.into_iter().map(|line| format!("  {}", line)));
    wrapped.push("});".to_string());
    wrapped
}
