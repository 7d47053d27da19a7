// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XMP packet reader. Only simple properties are needed (producer, creator
// tool, create/modify dates), written either as attributes on
// `rdf:Description` or as child elements, possibly wrapped in an
// `rdf:Alt`/`rdf:Seq` container. Names are matched by namespace URI, so
// `xap:CreatorTool` and `xmp:CreatorTool` are the same property.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{LocalName, Namespace, ResolveResult};
use tracing::debug;

/// XMP basic schema. Older Adobe tools bind it to the `xap` prefix.
pub const XMP_NS: &str = "http://ns.adobe.com/xap/1.0/";
/// Adobe PDF schema.
pub const PDF_NS: &str = "http://ns.adobe.com/pdf/1.3/";

/// A simple XMP property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub namespace: &'static str,
    /// Conventional prefix, accepted when a packet forgets to declare it.
    pub prefix: &'static str,
    pub name: &'static str,
}

pub const CREATE_DATE: Property = Property {
    namespace: XMP_NS,
    prefix: "xmp",
    name: "CreateDate",
};

pub const MODIFY_DATE: Property = Property {
    namespace: XMP_NS,
    prefix: "xmp",
    name: "ModifyDate",
};

pub const CREATOR_TOOL: Property = Property {
    namespace: XMP_NS,
    prefix: "xmp",
    name: "CreatorTool",
};

pub const PRODUCER: Property = Property {
    namespace: PDF_NS,
    prefix: "pdf",
    name: "Producer",
};

impl Property {
    fn matches(&self, (resolved, local): (ResolveResult<'_>, LocalName<'_>)) -> bool {
        if local.as_ref() != self.name.as_bytes() {
            return false;
        }
        match resolved {
            ResolveResult::Bound(Namespace(uri)) => uri == self.namespace.as_bytes(),
            ResolveResult::Unknown(prefix) => prefix == self.prefix.as_bytes(),
            ResolveResult::Unbound => false,
        }
    }
}

/// Return the first non-empty value of `wanted` in an XMP packet, with
/// entities decoded and whitespace collapsed. Nested markup inside an element
/// value is flattened to its text.
pub fn property(xml: &str, wanted: Property) -> Option<String> {
    let mut reader = NsReader::from_str(xml);
    // Nesting depth inside the matched element and the text gathered so far.
    let mut capture: Option<(usize, String)> = None;

    loop {
        let event = match reader.read_event() {
            Ok(Event::Eof) => return None,
            Ok(event) => event,
            Err(err) => {
                debug!(error = %err, property = wanted.name, "Malformed XMP packet");
                return None;
            }
        };

        match event {
            Event::Start(start) => match capture.as_mut() {
                Some((depth, _)) => *depth += 1,
                None if wanted.matches(reader.resolve_element(start.name())) => {
                    capture = Some((1, String::new()));
                }
                None => {
                    if let Some(value) = attribute_value(&reader, &start, wanted) {
                        return Some(value);
                    }
                }
            },
            Event::Empty(start) if capture.is_none() => {
                if let Some(value) = attribute_value(&reader, &start, wanted) {
                    return Some(value);
                }
            }
            Event::Text(text) => {
                if let (Some((_, buffer)), Ok(text)) = (capture.as_mut(), text.unescape()) {
                    buffer.push(' ');
                    buffer.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some((_, buffer)) = capture.as_mut() {
                    buffer.push(' ');
                    buffer.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                if let Some((depth, buffer)) = capture.as_mut() {
                    *depth -= 1;
                    if *depth == 0 {
                        let value = buffer.split_whitespace().collect::<Vec<_>>().join(" ");
                        if !value.is_empty() {
                            return Some(value);
                        }
                        capture = None;
                    }
                }
            }
            _ => {}
        }
    }
}

/// `prefix:Name="value"` on an element such as `rdf:Description`.
fn attribute_value(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    wanted: Property,
) -> Option<String> {
    start.attributes().flatten().find_map(|attr| {
        if !wanted.matches(reader.resolve_attribute(attr.key)) {
            return None;
        }
        let value = attr.unescape_value().ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: Property = Property {
        namespace: "http://purl.org/dc/elements/1.1/",
        prefix: "dc",
        name: "title",
    };

    const PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    xmlns:pdf="http://ns.adobe.com/pdf/1.3/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    pdf:Producer="iLovePDF &amp; friends"
    xmp:CreateDate="2024-01-01T00:00:00Z">
   <xmp:CreatorTool>GIMP 2.10</xmp:CreatorTool>
   <xmp:ModifyDate>2024-01-03T00:00:00Z</xmp:ModifyDate>
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Receipt 42</rdf:li></rdf:Alt></dc:title>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn element_property() {
        assert_eq!(property(PACKET, CREATOR_TOOL).as_deref(), Some("GIMP 2.10"));
        assert_eq!(
            property(PACKET, MODIFY_DATE).as_deref(),
            Some("2024-01-03T00:00:00Z")
        );
    }

    #[test]
    fn attribute_property_is_unescaped() {
        assert_eq!(
            property(PACKET, PRODUCER).as_deref(),
            Some("iLovePDF & friends")
        );
        assert_eq!(
            property(PACKET, CREATE_DATE).as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn nested_container_is_flattened() {
        assert_eq!(property(PACKET, TITLE).as_deref(), Some("Receipt 42"));
    }

    #[test]
    fn legacy_xap_prefix_resolves_to_xmp_schema() {
        let packet = r#"<rdf:Description xmlns:xap="http://ns.adobe.com/xap/1.0/">
            <xap:CreatorTool>GIMP 2.10</xap:CreatorTool>
        </rdf:Description>"#;
        assert_eq!(property(packet, CREATOR_TOOL).as_deref(), Some("GIMP 2.10"));

        let attribute = r#"<rdf:Description xmlns:xap="http://ns.adobe.com/xap/1.0/"
            xap:ModifyDate="2024-02-01T00:00:00Z"/>"#;
        assert_eq!(
            property(attribute, MODIFY_DATE).as_deref(),
            Some("2024-02-01T00:00:00Z")
        );
    }

    #[test]
    fn character_references_are_decoded() {
        let packet = r#"<rdf:Description xmlns:xmp="http://ns.adobe.com/xap/1.0/">
            <xmp:CreatorTool>Adobe&#32;Photoshop&#x20;CS6</xmp:CreatorTool>
        </rdf:Description>"#;
        assert_eq!(
            property(packet, CREATOR_TOOL).as_deref(),
            Some("Adobe Photoshop CS6")
        );
    }

    #[test]
    fn same_local_name_in_another_namespace_is_ignored() {
        let packet = r#"<rdf:Description xmlns:acme="urn:acme:schema">
            <acme:CreatorTool>Scanner</acme:CreatorTool>
        </rdf:Description>"#;
        assert_eq!(property(packet, CREATOR_TOOL), None);
    }

    #[test]
    fn undeclared_conventional_prefix_still_matches() {
        let packet = "<rdf:Description><xmp:CreatorTool>Sejda</xmp:CreatorTool></rdf:Description>";
        assert_eq!(property(packet, CREATOR_TOOL).as_deref(), Some("Sejda"));
    }

    #[test]
    fn missing_empty_and_malformed() {
        let missing = Property {
            name: "MetadataDate",
            ..CREATE_DATE
        };
        assert_eq!(property(PACKET, missing), None);
        let prefix_of_name = Property {
            name: "Create",
            ..CREATE_DATE
        };
        assert_eq!(property(PACKET, prefix_of_name), None);

        let empty = r#"<rdf:Description xmlns:xmp="http://ns.adobe.com/xap/1.0/">
            <xmp:CreatorTool>  </xmp:CreatorTool>
            <xmp:CreatorTool>Second</xmp:CreatorTool>
        </rdf:Description>"#;
        assert_eq!(property(empty, CREATOR_TOOL).as_deref(), Some("Second"));

        assert_eq!(property("<xmp:CreatorTool>GIMP</oops>", CREATOR_TOOL), None);
    }
}
