use deck_core::{FolderLink, NotifyError};

/// Admin address first, then the extra recipients, without blanks or repeats
pub fn merge_recipients(admin: Option<&str>, extra: &[String]) -> Result<Vec<String>, NotifyError> {
    let mut recipients: Vec<String> = Vec::new();

    for candidate in admin.into_iter().chain(extra.iter().map(String::as_str)) {
        let candidate = candidate.trim();
        if candidate.is_empty()
            || recipients
                .iter()
                .any(|r| r.eq_ignore_ascii_case(candidate))
        {
            continue;
        }
        recipients.push(candidate.to_string());
    }

    if recipients.is_empty() {
        return Err(NotifyError::NoRecipients);
    }

    Ok(recipients)
}

/// Subject and body announcing a delivered batch
pub fn compose_delivery_message(
    topic: &str,
    slide_count: u32,
    link: &FolderLink,
) -> (String, String) {
    let title = if topic.trim().is_empty() {
        "Slideshow"
    } else {
        topic.trim()
    };

    let subject = format!("Slideshow ready: {}", title);
    let body = format!(
        "Your slideshow \"{}\" has been published.\n\n\
         Slides: {}\n\
         Folder: {}\n\n\
         All slides and the manifest were verified in the destination folder.\n",
        title, slide_count, link
    );

    (subject, body)
}
