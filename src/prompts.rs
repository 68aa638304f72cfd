//! Fixed prompt texts sent with every request.

/// Which prompt a run sends alongside each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    /// Identify the document type; output is parsed as JSON.
    #[default]
    Classify,
    /// Pull out patient, visit and billing details; output is kept as text.
    Extract,
}

impl Task {
    /// The user-facing prompt for this task.
    pub fn prompt(self) -> &'static str {
        match self {
            Task::Classify => DOCTYPE_PROMPT,
            Task::Extract => EXTRACT_INFO_PROMPT,
        }
    }

    /// Console line announcing that `name` is being processed.
    pub fn progress_line(self, name: &str) -> String {
        match self {
            Task::Classify => format!("checking document type for {}", name),
            Task::Extract => format!("{}: Extract information", name),
        }
    }
}

/// Asks the model to identify and describe the document and answer as a JSON object
/// with `docTitle`, `organization`, `docType`, `description` and `explanation`.
pub const DOCTYPE_PROMPT: &str = "\
Context:
This is a document submitted as part of a medical claim process, the document may contain both English and Chinese information.
The submitted document contains doctors' handwritten diagnostic, and itemized billing items on invoices with watermarks.
The document will have both English and Chinese information.

Based on the information in this document please identify the type of document.
Please describe the document, break it down into the different sections.
Explain your decision

Output:
Return the information in plain text in json strictly in the following format
Do not use markdown.
{
docTitle: <title of document>,
organization: <name of organization, if available>
docType: <doctype>,
description: <description of docs>,
explanation: <explain your decision>
}
";

/// Extraction prompt. The answer is free text (tables and JSON fragments mixed).
pub const EXTRACT_INFO_PROMPT: &str = "\
this is a document submitted as part of a medical insurance expense claim. It includes a patient's clinical history , doctor's diagnosis and itemized billing items.
It contains both handwritten and printed information
1.  Extract the patient information
2.  Extract the hospital admission and discharge dates; or date of visit.
3.  Extract the diagnosis and operation / procedure performed?
4.  Please extract all the information in the bill,  return them in table format
5. Please extract all the information in the bill, return them in json format
If the information is not clear or the image quality is bad, do not make things up
";

/// Persona applied once per request as the system instruction.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert in recognizing handwritten and printed information in documents that are submitted for medical expenses claim.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prompt_names_every_result_key() {
        let prompt = Task::Classify.prompt();
        for key in ["docTitle", "organization", "docType", "description", "explanation"] {
            assert!(prompt.contains(key), "prompt should mention {}", key);
        }
        assert!(prompt.contains("Do not use markdown."));
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            Task::Classify.progress_line("bill 1.pdf"),
            "checking document type for bill 1.pdf"
        );
        assert_eq!(
            Task::Extract.progress_line("claim.pdf"),
            "claim.pdf: Extract information"
        );
    }

    #[test]
    fn test_extract_prompt_selected() {
        assert_eq!(Task::Extract.prompt(), EXTRACT_INFO_PROMPT);
        assert_eq!(Task::default(), Task::Classify);
    }
}
