//! Prompts for medical document extraction.

/// System instruction sent ahead of every extraction request.
pub const SYSTEM_PROMPT: &str = "You are a highly efficient and precise JSON extraction assistant. Your sole purpose is to extract specific information from provided medical documents and output it strictly in the requested JSON format, with no additional text or conversational filler.";

/// French extraction instruction (default).
pub const EXTRACTION_PROMPT_FR: &str = r#"Extrayez les informations suivantes du document fourni, au format JSON. Votre réponse DOIT contenir UNIQUEMENT l'objet JSON, et aucun autre texte ou remplissage conversationnel.

{
 "date_examen": "jj/mm/aaaa",
 "type_document": "",
 "specialite_medecin": "",
 "conclusions": ""
}

Instructions:
- **date_examen**: Extraire la date de l'examen (jj/mm/aaaa). Si la date n'est pas mentionnée explicitement dans le document (y compris les dates manuscrites), la valeur doit être "inconnu".
- **type_document**: Déterminez le type de document médical. Cela peut être un type d'IRM, un Scanner (mentionnez le nom complet du document). Si le type n'est pas explicitement mentionné, déduisez-le du contexte médical ou, s'il est manuscrit, identifiez-le comme une ordonnance médicale ou une lettre médicale. Si aucune déduction n'est possible, la valeur doit être "inconnu".
- **specialite_medecin**: Déterminez la spécialité du médecin. Si la spécialité n'est pas mentionnée explicitement, essayez de la déduire du contexte médical. Si aucune déduction n'est possible, la valeur doit être "inconnu".
- **conclusions**: Extraire les conclusions de l'examen si elles sont clairement mentionnées dans le document. Si aucune conclusion claire n'est présente, ou si le type de document est une ordonnance médicale ou une lettre médicale, la valeur doit être "inconnu"."#;

/// English extraction instruction. Keys and the "inconnu" sentinel match the French prompt.
pub const EXTRACTION_PROMPT_EN: &str = r#"Extract the following information from the provided document, in JSON format. Your answer MUST contain ONLY the JSON object, and no other text or conversational filler.

{
 "date_examen": "dd/mm/yyyy",
 "type_document": "",
 "specialite_medecin": "",
 "conclusions": ""
}

Instructions:
- **date_examen**: Extract the examination date (dd/mm/yyyy). If the date is not explicitly mentioned in the document (including handwritten dates), the value must be "inconnu".
- **type_document**: Determine the type of medical document. It may be a kind of MRI or a CT scan (give the full name of the document). If the type is not explicitly mentioned, infer it from the medical context or, if handwritten, identify it as a medical prescription or a medical letter. If no inference is possible, the value must be "inconnu".
- **specialite_medecin**: Determine the physician's specialty. If the specialty is not explicitly mentioned, try to infer it from the medical context. If no inference is possible, the value must be "inconnu".
- **conclusions**: Extract the examination conclusions if they are clearly stated in the document. If there is no clear conclusion, or if the document is a medical prescription or a medical letter, the value must be "inconnu"."#;

/// Get the extraction prompt by language.
///
/// # Arguments
/// * `lang` - Language code, "fr" for French, "en" for English.
///
/// # Returns
/// Prompt text. Unknown codes fall back to French.
pub fn get_extraction_prompt(lang: &str) -> &'static str {
    match lang {
        "en" => EXTRACTION_PROMPT_EN,
        _ => EXTRACTION_PROMPT_FR,
    }
}
