//! Streaming metadata extraction.
//!
//! Markup is fed to a `lol_html` rewriter chunk by chunk. Handlers registered
//! per selector copy attribute values and title text into a
//! [`PreviewMetadata`] as the parser reaches them, so the document itself is
//! never buffered.

use std::{
    borrow::Cow,
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use lol_html::{
    html_content::TextChunk,
    send::{Element, ElementContentHandlers, HtmlRewriter, Settings},
    HandlerResult, Selector,
};

use crate::error::{PreviewError, PreviewResult};
use crate::models::PreviewMetadata;

#[derive(Clone, Copy, Debug)]
enum Field {
    CustomDescription,
    CustomImage,
    Description,
    OgImage,
    OgVideoUrl,
    TwitterPlayer,
    EmbedUrl,
}

/// `<meta>` inside `<head>`: when attribute `key` equals `value`, copy
/// attribute `source` into `field`.
struct MetaRule {
    key: &'static str,
    value: &'static str,
    source: &'static str,
    field: Field,
}

#[rustfmt::skip]
const HEAD_META_RULES: &[MetaRule] = &[
    MetaRule { key: "name", value: "page-preview", source: "content", field: Field::CustomDescription },
    MetaRule { key: "name", value: "custom-image", source: "href", field: Field::CustomImage },
    MetaRule { key: "name", value: "description", source: "content", field: Field::Description },
    MetaRule { key: "property", value: "og:image", source: "content", field: Field::OgImage },
    MetaRule { key: "property", value: "og:video:url", source: "content", field: Field::OgVideoUrl },
    MetaRule { key: "name", value: "twitter_player", source: "content", field: Field::TwitterPlayer },
    MetaRule { key: "itemprop", value: "embedURL", source: "content", field: Field::EmbedUrl },
];

/// `<link itemprop="embedUrl" href=...>`. Lowercase `Url`, unlike the meta rule.
const LINK_EMBED_ITEMPROP: &str = "embedUrl";

fn slot(metadata: &mut PreviewMetadata, field: Field) -> &mut Option<String> {
    match field {
        Field::CustomDescription => &mut metadata.custom_description,
        Field::CustomImage => &mut metadata.custom_image,
        Field::Description => &mut metadata.description,
        Field::OgImage => &mut metadata.og_image,
        Field::OgVideoUrl => &mut metadata.og_video_url,
        Field::TwitterPlayer => &mut metadata.twitter_player,
        Field::EmbedUrl => &mut metadata.embed_url,
    }
}

/// First non-blank value wins. Whitespace-only values count as blank and
/// are skipped like empty or absent ones.
fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_some() {
        return;
    }
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(value);
    }
}

/// Mutable state shared by the registered handlers.
#[derive(Default)]
struct Collected {
    metadata: PreviewMetadata,
    link_embed_url: Option<String>,
}

impl Collected {
    fn on_head_meta<A>(&mut self, attr: A)
    where
        A: Fn(&str) -> Option<String>,
    {
        for rule in HEAD_META_RULES {
            if attr(rule.key).as_deref() == Some(rule.value) {
                set_once(slot(&mut self.metadata, rule.field), attr(rule.source));
            }
        }
    }

    fn on_link<A>(&mut self, attr: A)
    where
        A: Fn(&str) -> Option<String>,
    {
        if attr("itemprop").as_deref() == Some(LINK_EMBED_ITEMPROP) {
            set_once(&mut self.link_embed_url, attr("href"));
        }
    }

    fn on_title_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.metadata.title {
            Some(title) => title.push_str(text),
            None => self.metadata.title = Some(text.to_owned()),
        }
    }

    /// The link-sourced embed URL is registered after the meta rules and
    /// takes precedence over them.
    fn into_metadata(self) -> PreviewMetadata {
        let mut metadata = self.metadata;
        if let Some(embed_url) = self.link_embed_url {
            metadata.embed_url = Some(embed_url);
        }
        metadata
    }
}

type SharedState = Arc<Mutex<Collected>>;

fn lock(state: &SharedState) -> MutexGuard<'_, Collected> {
    // A panicking handler leaves the fields it already set intact.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn element_handler<F>(handler: F) -> F
where
    F: FnMut(&mut Element<'_, '_>) -> HandlerResult + Send,
{
    handler
}

#[inline]
fn text_handler<F>(handler: F) -> F
where
    F: FnMut(&mut TextChunk<'_>) -> HandlerResult + Send,
{
    handler
}

type Sink = fn(&[u8]);

/// Rewritten output is not needed, only the handler side effects.
fn discard(_: &[u8]) {}

/// Incremental extractor over one HTML document.
///
/// Call [`write`](Self::write) for every body chunk in order, then
/// [`finish`](Self::finish). Handlers only fire for markup the parser has
/// consumed, so skipping `finish` can leave fields unset.
///
/// The extractor is `Send`, so it can be driven inline from an async task
/// between reads of the response body.
pub struct MetadataExtractor {
    rewriter: HtmlRewriter<'static, Sink>,
    collected: SharedState,
}

impl MetadataExtractor {
    pub fn new() -> PreviewResult<Self> {
        let collected: SharedState = Arc::default();

        let meta_state = Arc::clone(&collected);
        let link_state = Arc::clone(&collected);
        let title_state = Arc::clone(&collected);

        let head_meta = Selector::from_str("head > meta")?;
        let link = Selector::from_str("link")?;
        let title = Selector::from_str("title")?;

        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    (
                        Cow::Owned(head_meta),
                        ElementContentHandlers::default().element(element_handler(move |el| {
                            lock(&meta_state).on_head_meta(|name| el.get_attribute(name));
                            Ok(())
                        })),
                    ),
                    (
                        Cow::Owned(link),
                        ElementContentHandlers::default().element(element_handler(move |el| {
                            lock(&link_state).on_link(|name| el.get_attribute(name));
                            Ok(())
                        })),
                    ),
                    (
                        Cow::Owned(title),
                        ElementContentHandlers::default().text(text_handler(move |chunk| {
                            lock(&title_state).on_title_text(chunk.as_str());
                            Ok(())
                        })),
                    ),
                ],
                ..Settings::new_send()
            },
            discard as Sink,
        );

        Ok(Self {
            rewriter,
            collected,
        })
    }

    /// Feed the next chunk of the document.
    pub fn write(&mut self, chunk: &[u8]) -> PreviewResult<()> {
        self.rewriter.write(chunk)?;
        Ok(())
    }

    /// Flush the parser and return everything extracted.
    pub fn finish(self) -> PreviewResult<PreviewMetadata> {
        let Self {
            rewriter,
            collected,
        } = self;
        rewriter.end()?;
        let collected = std::mem::take(&mut *lock(&collected));
        Ok(collected.into_metadata())
    }
}

/// Drain `body` through a [`MetadataExtractor`].
///
/// Each chunk is parsed on the calling task as soon as it arrives; the task
/// yields only while waiting for the next chunk.
pub async fn extract_stream<S, E>(body: S) -> PreviewResult<PreviewMetadata>
where
    S: Stream<Item = Result<Bytes, E>>,
    PreviewError: From<E>,
{
    let mut body = std::pin::pin!(body);
    let mut extractor = MetadataExtractor::new()?;

    while let Some(chunk) = body.next().await {
        extractor.write(&chunk?)?;
    }

    extractor.finish()
}
