// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_document(sections: usize) -> String {
    let base = "<h2>Section</h2><p>Paragraph with <b>some</b> content.<br /><br /></p><ul><li>Item</li><li>Another item</li></ul>";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_card_document(key: &str, rows: usize) -> String {
    let mut content = format!("<p>intro</p><div data-card-key=\"{key}\"><table>");
    for row in 0..rows {
        content.push_str(&format!("<tr><td>a{row}</td><td>b{row}</td></tr>"));
    }
    content.push_str("</table></div>");
    content
}
