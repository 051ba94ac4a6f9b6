//! Meta-tag presentation of frame descriptors.

use crate::descriptor::FrameDescriptor;
use serde::Serialize;
use std::fmt::Write;

/// Frame endpoint response: the descriptor plus its meta-tag rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResponse {
    #[serde(flatten)]
    pub descriptor: FrameDescriptor,
    pub frame_html: String,
}

impl From<FrameDescriptor> for FrameResponse {
    fn from(descriptor: FrameDescriptor) -> Self {
        let frame_html = frame_html(&descriptor);
        Self {
            descriptor,
            frame_html,
        }
    }
}

pub fn frame_meta_tags(descriptor: &FrameDescriptor) -> String {
    let mut tags = String::new();
    push_property(&mut tags, "fc:frame", "vNext");
    push_property(&mut tags, "fc:frame:image", &descriptor.image_url);
    for button in &descriptor.buttons {
        push_property(
            &mut tags,
            &format!("fc:frame:button:{}", button.index),
            &button.label,
        );
    }
    push_property(&mut tags, "fc:frame:post_url", &descriptor.post_url);
    push_property(&mut tags, "fc:frame:state", &descriptor.state);
    tags
}

pub fn frame_html(descriptor: &FrameDescriptor) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n{}</head>\n<body></body>\n</html>\n",
        frame_meta_tags(descriptor)
    )
}

/// `GET /` document: the initial frame plus Open Graph tags for link previews.
pub fn landing_page(descriptor: &FrameDescriptor, host: &str) -> String {
    let mut head = String::new();
    head.push_str("<meta charset=\"utf-8\">\n<title>RateMyBags - Crypto Portfolio Rating</title>\n");
    push_property(&mut head, "og:title", "RateMyBags - Crypto Portfolio Rating");
    push_property(
        &mut head,
        "og:description",
        "Rate your crypto portfolio and share it with the Farcaster community",
    );
    push_property(&mut head, "og:image", &descriptor.image_url);
    push_property(&mut head, "og:url", host);
    head.push_str(&frame_meta_tags(descriptor));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n{head}</head>\n<body>\n<h1>RateMyBags</h1>\n\
         <p>This is a Farcaster Frame. Open it in a Farcaster client to interact.</p>\n</body>\n</html>\n"
    )
}

fn push_property(out: &mut String, property: &str, content: &str) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "<meta property=\"{}\" content=\"{}\">",
        escape(property),
        escape(content)
    );
}

pub(crate) fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Button;
    use crate::state::Step;

    fn descriptor() -> FrameDescriptor {
        FrameDescriptor {
            step: Step::NftMinting,
            image_url: "https://h/images/nft-minting.png".into(),
            buttons: vec![Button {
                label: "Confirm Mint & Share".into(),
                index: 1,
            }],
            post_url: "https://h/api/frame".into(),
            state: "eyJzdGVwIjoibmZ0TWludGluZyJ9".into(),
        }
    }

    #[test]
    fn renders_frame_tags_in_order() {
        let html = frame_html(&descriptor());
        let frame = html.find("fc:frame\"").expect("version tag");
        let image = html.find("fc:frame:image").expect("image tag");
        let button = html.find("fc:frame:button:1").expect("button tag");
        let post = html.find("fc:frame:post_url").expect("post tag");
        assert!(frame < image && image < button && button < post);
        assert!(html.contains("content=\"vNext\""));
        assert!(html.contains("content=\"eyJzdGVwIjoibmZ0TWludGluZyJ9\""));
    }

    #[test]
    fn labels_are_escaped() {
        let html = frame_html(&descriptor());
        assert!(html.contains("Confirm Mint &amp; Share"));
        assert_eq!(escape(r#"<a href="x">'"#), "&lt;a href=&quot;x&quot;&gt;&#39;");
    }

    #[test]
    fn response_flattens_the_descriptor() {
        let value = serde_json::to_value(FrameResponse::from(descriptor())).expect("serializes");
        assert_eq!(value["postUrl"], "https://h/api/frame");
        assert_eq!(value["buttons"][0]["index"], 1);
        assert!(value["frameHtml"].as_str().is_some_and(|h| h.contains("fc:frame:state")));
    }

    #[test]
    fn landing_page_carries_og_and_frame_tags() {
        let page = landing_page(&descriptor(), "https://h");
        assert!(page.contains("property=\"og:image\" content=\"https://h/images/nft-minting.png\""));
        assert!(page.contains("property=\"fc:frame:button:1\""));
    }
}
