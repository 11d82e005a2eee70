//! Server-side HTML for the generation form and result gallery.

use crate::models::ImageSize;

pub const SIZE_CHOICES: [&str; 3] = ["1K", "2K", "4K"];

#[derive(Debug, Clone)]
pub struct PageState {
    pub prompt: String,
    pub images_text: String,
    pub max_images: u32,
    pub size: String,
    pub watermark: bool,
    pub urls: Vec<String>,
    pub error: Option<String>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            images_text: String::new(),
            max_images: crate::models::DEFAULT_MAX_IMAGES,
            size: ImageSize::default().to_string(),
            watermark: true,
            urls: Vec::new(),
            error: None,
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn size_options(selected: &str) -> String {
    let mut choices: Vec<&str> = SIZE_CHOICES.to_vec();
    if !selected.is_empty() && !choices.iter().any(|c| c.eq_ignore_ascii_case(selected)) {
        choices.push(selected);
    }
    choices
        .iter()
        .map(|choice| {
            let mark = if choice.eq_ignore_ascii_case(selected) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{v}"{mark}>{v}</option>"#,
                v = escape(choice),
                mark = mark
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

fn gallery(urls: &[String]) -> String {
    if urls.is_empty() {
        return String::new();
    }
    let items = urls
        .iter()
        .map(|url| {
            let url = escape(url);
            format!(
                r#"<a href="{url}" target="_blank" rel="noopener"><img src="{url}" alt="generated image" loading="lazy"></a>"#,
                url = url
            )
        })
        .collect::<Vec<_>>()
        .join("\n      ");
    format!(
        "<section class=\"gallery\">\n      {}\n    </section>",
        items
    )
}

pub fn render(state: &PageState) -> String {
    let error = state
        .error
        .as_deref()
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let (watermark_true, watermark_false) = if state.watermark {
        (" selected", "")
    } else {
        ("", " selected")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Seedream Image Generation</title>
    <style>
      body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; }}
      label {{ display: block; margin-top: 0.75rem; }}
      textarea, input[type=text] {{ width: 100%; }}
      .error {{ color: #b00020; }}
      .gallery {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; margin-top: 1.5rem; }}
      .gallery img {{ width: 100%; border-radius: 6px; }}
    </style>
  </head>
  <body>
    <h1>Seedream Image Generation</h1>
    {error}
    <form method="post" action="/">
      <label>Prompt
        <textarea name="prompt" rows="4" required>{prompt}</textarea>
      </label>
      <label>Reference image URLs (one per line)
        <textarea name="images_text" rows="3">{images_text}</textarea>
      </label>
      <label>Number of images
        <input type="number" name="max_images" min="1" value="{max_images}">
      </label>
      <label>Size
        <select name="size">{sizes}</select>
      </label>
      <label>Watermark
        <select name="watermark">
          <option value="True"{wm_true}>Yes</option>
          <option value="False"{wm_false}>No</option>
        </select>
      </label>
      <button type="submit">Generate</button>
    </form>
    {gallery}
  </body>
</html>
"#,
        error = error,
        prompt = escape(&state.prompt),
        images_text = escape(&state.images_text),
        max_images = state.max_images,
        sizes = size_options(&state.size),
        wm_true = watermark_true,
        wm_false = watermark_false,
        gallery = gallery(&state.urls),
    )
}
