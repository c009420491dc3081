// src/utils/html.rs

/// Sanitizes authored HTML (passages, instructions, explanations) with ammonia.
///
/// Formatting tags such as <p>, <b> and <table> survive; <script>, <iframe>
/// and event-handler attributes are dropped. Script and style contents are
/// removed along with the tag.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
