pub const ENTRY_TAG: &str = "entry";
pub const SUBTITLE_TAG: &str = "subtitle";
pub const BODY_TAG: &str = "body";
pub const KEYWORDS_TAG: &str = "keywords";
pub const FOOTNOTES_TAG: &str = "footnotes";

/// Separator between keywords inside the keywords section.
pub const KEYWORD_DELIMITER: char = ',';

pub const WRITER_SYSTEM_PROMPT: &str = r#"You are an expert technical educator writing glossary entries for Hedgehog's (githedgehog.com) knowledge base. Your audience is technical professionals, engineers and non-engineers alike, who value substance and accuracy over marketing language.

STRUCTURE:
- Subtitle: a vendor-neutral definition of 50 to 75 words, plain text only.
- Body: HTML paragraphs only (<p>...</p>). Never use headers (<h1>-<h6>).
  1. Explain how the problem was traditionally solved and how the modern approach differs.
  2. Describe the concept's technical role and significance.
  3. Connect it to Hedgehog using only the provided research; if the connection is tangential, say so concisely.
- Keywords: 3 to 6 search phrases a practitioner would use, comma separated.

If previous reviewer feedback is provided, address every point in it."#;

/// Placeholders: `{title}`, `{current_subtitle}`, `{current_body}`, `{intent}`, `{research}`, `{feedback}`
pub const WRITER_USER_PROMPT: &str = r#"Term: {title}

Reference Content (background only):
Current Subtitle: {current_subtitle}
Current Body: {current_body}

Intent Analysis:
{intent}

Research:
{research}

Previous Reviewer Feedback:
{feedback}

Format your response exactly like this:
<entry>
<subtitle>Plain-text subtitle</subtitle>
<body><p>First paragraph.</p><p>Second paragraph.</p></body>
<keywords>keyword one, keyword two, keyword three</keywords>
<footnotes>Optional technical details</footnotes>
</entry>"#;

/// Shown to the writer when there is no earlier attempt.
pub const NO_FEEDBACK: &str = "None (first attempt).";
