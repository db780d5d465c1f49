//! Sample email documents for testing and demonstration.
//!
//! Each template is shaped like SSR output: table-based layout, utility
//! classes, inline styles, and the artifacts the post-processor removes.

/// Minimal document for unit testing.
pub fn minimal_template() -> &'static str {
    "<html><head><title>Minimal</title></head><body><p>Body text</p></body></html>"
}

/// Welcome email with a style block, utility classes, and SSR artifacts.
pub fn welcome_template() -> &'static str {
    r##"<html><head><title>Welcome</title><style>
.btn { background-color: #2b6cb0; color: #ffffff; }
</style></head><body>
<!---->
<table class="w-full" role="presentation" cellpadding="0" cellspacing="0">
<tr><td class="p-4 text-center">
<h1 style="font-size: 24px; color: #1a365d;">Welcome aboard</h1>
<!--[-->
<p class="text-gray-700">Thanks for signing up. We are glad to have you.</p>
<!--]-->
<a class="btn p-2 rounded" href="https://example.com/start">Get started</a>
</td></tr>
</table>
<img src="https://example.com/pixel.png" alt="" onload="this.__e=event" />
</body></html>"##
}

/// Invoice email exercising tables and Outlook conditional comments.
pub fn invoice_template() -> &'static str {
    r##"<html><head><title>Invoice #2024-001</title></head><body>
<!--[if mso]><table role="presentation" width="600"><tr><td><![endif]-->
<table class="w-full">
<tr>
<th class="text-left p-2 bg-gray-200">Item</th>
<th class="text-left p-2 bg-gray-200">Qty</th>
<th class="text-left p-2 bg-gray-200">Total</th>
</tr>
<tr><td class="p-2">Web Development</td><td class="p-2">40</td><td class="p-2">$6,000.00</td></tr>
<tr><td class="p-2">Design Services</td><td class="p-2">20</td><td class="p-2">$2,500.00</td></tr>
</table>
<p class="text-right font-bold" style="mso-padding-alt: 0;">Total: $8,500.00</p>
<!--[if mso]></td></tr></table><![endif]-->
</body></html>"##
}

/// Responsive template using the `data-mq-*` micro-protocol.
pub fn responsive_template() -> &'static str {
    r##"<html><head><title>Responsive</title></head><body>
<table id="shell" class="w-full" data-mq-mobile="width: 100%; padding: 8px;" data-mq-desktop="width: 600px;">
<tr><td data-mq-dark="background-color: #111827; color: #f3f4f6;">
<p>Resize me.</p>
</td></tr>
</table>
</body></html>"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_valid_markup() {
        let templates: Vec<(&str, &str)> = vec![
            ("minimal", minimal_template()),
            ("welcome", welcome_template()),
            ("invoice", invoice_template()),
            ("responsive", responsive_template()),
        ];

        for (name, html) in templates {
            let dom = crate::dom::parse_html(html);
            assert!(
                !dom.is_empty(),
                "Template '{}' should parse to non-empty DOM",
                name
            );
            let out = crate::dom::serialize(&dom);
            assert!(out.contains("<body>"), "Template '{}' lost its body", name);
        }
    }
}
