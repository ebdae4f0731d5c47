//! The case record returned by a successful search and its display form.
//!
//! Every field is optional. A section is shown only when at least one of
//! its fields is present, and absent fields inside a shown section are
//! left out rather than rendered blank. List entries keep server order and
//! are numbered from 1.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    pub registration_number: Option<String>,
    pub judge: Option<String>,
    pub business_date: Option<String>,
    pub hearing_date: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActEntry {
    pub under_act: Option<String>,
    pub under_section: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderEntry {
    pub order_number: Option<String>,
    pub order_date: Option<String>,
    pub order_details: Option<String>,
    pub download_link: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessEntry {
    pub process_id: Option<String>,
    pub process_date: Option<String>,
    pub process_title: Option<String>,
    pub party_name: Option<String>,
    pub issued_process: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseResult {
    pub case_type: Option<String>,
    pub filing_number: Option<String>,
    pub filing_date: Option<String>,
    pub registration_number: Option<String>,
    pub registration_date: Option<String>,
    pub cnr_number: Option<String>,

    pub first_hearing_date: Option<String>,
    pub decision_date: Option<String>,
    pub case_status: Option<String>,
    pub nature_of_disposal: Option<String>,
    pub court_number_and_judge: Option<String>,

    pub police_station: Option<String>,
    pub fir_number: Option<String>,
    pub fir_year: Option<String>,

    #[serde(deserialize_with = "null_as_empty")]
    pub petitioners: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub respondents: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub case_history: Vec<HistoryEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub acts: Vec<ActEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub orders: Vec<OrderEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub process_details: Vec<ProcessEntry>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    CaseDetails,
    CaseStatus,
    FirDetails,
    Petitioners,
    Respondents,
    CaseHistory,
    Acts,
    Orders,
    ProcessDetails,
}

impl SectionKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::CaseDetails => "Case Details",
            Self::CaseStatus => "Case Status",
            Self::FirDetails => "FIR Details",
            Self::Petitioners => "Petitioners",
            Self::Respondents => "Respondents",
            Self::CaseHistory => "Case History",
            Self::Acts => "Acts",
            Self::Orders => "Orders",
            Self::ProcessDetails => "Process Details",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based position in the list as received.
    pub index: usize,
    pub heading: String,
    pub fields: Vec<Field>,
    pub link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionBody {
    Fields { fields: Vec<Field> },
    /// Numbered one-line items such as `1) A`.
    Names { items: Vec<String> },
    Entries { entries: Vec<Entry> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSection {
    pub kind: SectionKind,
    pub title: String,
    pub body: SectionBody,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultView {
    pub sections: Vec<ResultSection>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn fields(pairs: &[(&str, &Option<String>)]) -> Vec<Field> {
    pairs
        .iter()
        .filter_map(|(label, value)| {
            present(value).map(|v| Field {
                label: (*label).to_string(),
                value: v.to_string(),
            })
        })
        .collect()
}

/// Keeps links the browser can follow safely: absolute http(s) or any
/// relative reference such as `display_pdf.php?filename=x`. Other schemes and
/// protocol-relative `//host` links are dropped.
pub fn safe_link(link: &Option<String>) -> Option<String> {
    let link = present(link)?;
    if link.chars().any(char::is_control) || link.starts_with("//") || link.starts_with('\\') {
        return None;
    }
    // A colon before any of `/?#` makes the prefix a scheme.
    let ok = match link.find([':', '/', '?', '#']) {
        Some(i) if link[i..].starts_with(':') => {
            let scheme = &link[..i];
            scheme.eq_ignore_ascii_case("https") || scheme.eq_ignore_ascii_case("http")
        }
        _ => true,
    };
    ok.then(|| link.to_string())
}

impl CaseResult {
    pub fn to_view(&self) -> ResultView {
        let mut sections = Vec::new();

        let mut push_fields = |kind: SectionKind, fields: Vec<Field>| {
            if !fields.is_empty() {
                sections.push(ResultSection {
                    kind,
                    title: kind.title().to_string(),
                    body: SectionBody::Fields { fields },
                });
            }
        };

        push_fields(
            SectionKind::CaseDetails,
            fields(&[
                ("Case Type", &self.case_type),
                ("Filing Number", &self.filing_number),
                ("Filing Date", &self.filing_date),
                ("Registration Number", &self.registration_number),
                ("Registration Date", &self.registration_date),
                ("CNR Number", &self.cnr_number),
            ]),
        );
        push_fields(
            SectionKind::CaseStatus,
            fields(&[
                ("First Hearing", &self.first_hearing_date),
                ("Decision Date", &self.decision_date),
                ("Status", &self.case_status),
                ("Nature of Disposal", &self.nature_of_disposal),
                ("Court & Judge", &self.court_number_and_judge),
            ]),
        );
        push_fields(
            SectionKind::FirDetails,
            fields(&[
                ("Police Station", &self.police_station),
                ("FIR Number", &self.fir_number),
                ("FIR Year", &self.fir_year),
            ]),
        );

        for (kind, names) in [
            (SectionKind::Petitioners, &self.petitioners),
            (SectionKind::Respondents, &self.respondents),
        ] {
            if !names.is_empty() {
                sections.push(ResultSection {
                    kind,
                    title: kind.title().to_string(),
                    body: SectionBody::Names {
                        items: names
                            .iter()
                            .enumerate()
                            .map(|(i, name)| format!("{}) {}", i + 1, name.trim()))
                            .collect(),
                    },
                });
            }
        }

        let history = self
            .case_history
            .iter()
            .enumerate()
            .map(|(i, h)| Entry {
                index: i + 1,
                heading: format!("Entry {}", i + 1),
                fields: fields(&[
                    ("Reg", &h.registration_number),
                    ("Judge", &h.judge),
                    ("Business Date", &h.business_date),
                    ("Hearing Date", &h.hearing_date),
                    ("Purpose", &h.purpose),
                ]),
                link: None,
            })
            .collect();
        push_entries(&mut sections, SectionKind::CaseHistory, history);

        let acts = self
            .acts
            .iter()
            .enumerate()
            .map(|(i, a)| Entry {
                index: i + 1,
                heading: format!("Act {}", i + 1),
                fields: fields(&[("Under Act", &a.under_act), ("Section", &a.under_section)]),
                link: None,
            })
            .collect();
        push_entries(&mut sections, SectionKind::Acts, acts);

        let orders = self
            .orders
            .iter()
            .enumerate()
            .map(|(i, o)| Entry {
                index: i + 1,
                heading: format!("Order {}", i + 1),
                fields: fields(&[
                    ("Number", &o.order_number),
                    ("Date", &o.order_date),
                    ("Details", &o.order_details),
                ]),
                link: safe_link(&o.download_link),
            })
            .collect();
        push_entries(&mut sections, SectionKind::Orders, orders);

        let processes = self
            .process_details
            .iter()
            .enumerate()
            .map(|(i, p)| Entry {
                index: i + 1,
                heading: format!("Process {}", i + 1),
                fields: fields(&[
                    ("ID", &p.process_id),
                    ("Date", &p.process_date),
                    ("Title", &p.process_title),
                    ("Party", &p.party_name),
                    ("Issued", &p.issued_process),
                ]),
                link: None,
            })
            .collect();
        push_entries(&mut sections, SectionKind::ProcessDetails, processes);

        ResultView { sections }
    }
}

fn push_entries(sections: &mut Vec<ResultSection>, kind: SectionKind, entries: Vec<Entry>) {
    if !entries.is_empty() {
        sections.push(ResultSection {
            kind,
            title: kind.title().to_string(),
            body: SectionBody::Entries { entries },
        });
    }
}

impl ResultView {
    pub fn section(&self, kind: SectionKind) -> Option<&ResultSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}
