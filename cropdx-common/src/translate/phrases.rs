//! Built-in English → Kinyarwanda phrase table
//!
//! Covers every text field of the default catalog.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static EN_RW: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Banana Bacterial Wilt
        ("Banana Bacterial Wilt", "Indwara ya Banana yo kurwara kuri Bacteria"),
        (
            "Bacterial disease causing wilting and yellowing.",
            "Indwara ya Bacteria ishobora gutuma ibimera byumva ubucucu no kuba umuhondo.",
        ),
        (
            "Rogue infected plants, sanitize tools, use clean planting material.",
            "Kuraho ibimera byarwaye, gukoresha ibikoresho byo gusukura, gukoresha ibyatsi byo gutera byera.",
        ),
        (
            "Maintain field hygiene; use resistant varieties; avoid tool sharing between fields.",
            "Komeza gusana isambu; gukoresha ubwoko butakwicwa; kwirinda gusangiza ibikoresho hagati y'amasambu.",
        ),
        // Maize Leaf Blight
        ("Maize Leaf Blight", "Indwara y'ibimera bya Maize"),
        (
            "Fungal leaf spots reducing photosynthesis.",
            "Ibiranga by'ibimera bifite amabara y'umweru bigabanya ubwoko bw'ibimera.",
        ),
        (
            "Rotate crops, remove residue, apply recommended fungicide if severe.",
            "Guhindura ibihingwa, gukuraho ibisigazwa, gukoresha ifungisidi zirinzwe niba byarakaze.",
        ),
        (
            "Ensure spacing for airflow; balanced fertilization; timely weeding.",
            "Kureba neza intera yo gukoresha umwuka; gukoresha ifumbire yuzuye; kubagura ibyatsi mu bihe.",
        ),
        // Potato Late Blight
        ("Potato Late Blight", "Indwara ya Potato yo kurwara"),
        (
            "Oomycete disease causing dark lesions on leaves and tubers.",
            "Indwara ya Oomycete ishobora gutuma haba amabara y'umukara kuri ibimera n'ibinyabutumbura.",
        ),
        (
            "Use certified seed, ensure airflow, apply protective fungicide as advised.",
            "Gukoresha imbuto zemewe, kureba neza ko umwuka uhagaze, gukoresha ifungisidi zirinzwe nk'uko byavuzwe.",
        ),
        (
            "Avoid overhead irrigation late in day; remove infected leaves; monitor weather alerts.",
            "Kwirinda gutera amazi mu gihe cy'umunsi; gukuraho ibibabi byarwaye; kureba amakuru y'ibihe.",
        ),
    ])
});

/// Exact-match lookup of an English phrase
pub fn lookup(text: &str) -> Option<&'static str> {
    EN_RW.get(text.trim()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact_and_trimmed() {
        assert_eq!(
            lookup("Fungal leaf spots reducing photosynthesis."),
            Some("Ibiranga by'ibimera bifite amabara y'umweru bigabanya ubwoko bw'ibimera.")
        );
        assert_eq!(lookup("  Potato Late Blight\n"), Some("Indwara ya Potato yo kurwara"));
        assert_eq!(lookup("potato late blight"), None);
    }
}
