/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe formatting tags (<b>, <p>, lists) survive while
/// <script>, <iframe> and event-handler attributes are stripped. Used for quiz
/// descriptions, which the frontend renders as rich text.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
