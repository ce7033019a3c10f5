//! File framing for generated contracts. Every format carries the same plain
//! text; only the extension and MIME type differ.

use std::fmt;
use std::str::FromStr;

use actix_web::HttpResponse;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFormat {
    #[default]
    Txt,
    Pdf,
    Docx,
}

impl DownloadFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DownloadFormat::Txt => "txt",
            DownloadFormat::Pdf => "pdf",
            DownloadFormat::Docx => "docx",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DownloadFormat::Txt => "text/plain; charset=utf-8",
            DownloadFormat::Pdf => "application/pdf",
            DownloadFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn filename(self, contract_type: &str) -> String {
        format!("{contract_type}-contract.{}", self.extension())
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DownloadFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(DownloadFormat::Txt),
            "pdf" => Ok(DownloadFormat::Pdf),
            "docx" => Ok(DownloadFormat::Docx),
            other => Err(AppError::BadRequest(format!("Unsupported download format: {other}"))),
        }
    }
}

/// Attachment response for `content` framed as `format`.
pub fn attachment(format: DownloadFormat, contract_type: &str, content: &str) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(format.filename(contract_type))],
    };
    HttpResponse::Ok()
        .content_type(format.mime())
        .insert_header(disposition)
        .body(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;

    #[test]
    fn parses_known_formats() {
        assert_eq!("PDF".parse::<DownloadFormat>().unwrap(), DownloadFormat::Pdf);
        assert_eq!("docx".parse::<DownloadFormat>().unwrap(), DownloadFormat::Docx);
        assert!("rtf".parse::<DownloadFormat>().is_err());
    }

    #[test]
    fn filename_uses_contract_type() {
        assert_eq!(DownloadFormat::Docx.filename("nda"), "nda-contract.docx");
    }

    #[test]
    fn attachment_headers() {
        let resp = attachment(DownloadFormat::Pdf, "nda", "text");
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("nda-contract.pdf"));
    }
}
