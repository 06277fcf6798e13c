//! Prompt assembly. Everything here is pure string building.

use std::collections::HashSet;

use roomcraft_contracts::records::{AnalysisRecord, BudgetTier};

const FEATURES_FALLBACK: &str = "standard room features";

const KEY_ITEM_KEYWORDS: &[&str] = &[
    "laptop",
    "computer",
    "desk",
    "table",
    "chair",
    "sofa",
    "couch",
    "bed",
    "shelf",
    "bookshelf",
    "lamp",
    "light",
    "plant",
    "rug",
    "tv",
    "television",
    "monitor",
    "keyboard",
    "ottoman",
    "stool",
    "cabinet",
    "dresser",
    "nightstand",
    "bench",
    "mirror",
    "artwork",
    "painting",
    "clock",
    "vase",
    "cushion",
    "pillow",
    "blanket",
    "curtain",
    "blinds",
    "coffee table",
    "side table",
    "reading chair",
    "armchair",
    "bean bag",
    "storage",
    "shelving",
];

fn features_text(record: &AnalysisRecord) -> String {
    let features = &record.analysis.features;
    if features.is_empty() {
        FEATURES_FALLBACK.to_string()
    } else {
        features.join(", ")
    }
}

/// Coordinator brief for a preset-style run.
pub fn design_brief(record: &AnalysisRecord, style: &str, budget: BudgetTier) -> String {
    let room = &record.analysis;
    format!(
        "Transform this {room_type} into a {style} space.\n\
         \n\
         Current condition: {condition}\n\
         Room size: {size}\n\
         Key features to maintain: {features}\n\
         \n\
         Design goals:\n\
         - Update to {style} aesthetic\n\
         - Improve lighting and atmosphere\n\
         - Maximize functionality\n\
         - Stay within {budget} budget range\n",
        room_type = room.room_type,
        condition = room.condition,
        size = room.dimensions_estimate,
        features = room.features.join(", "),
        budget = budget.as_str(),
    )
}

/// Brief built around the user's own words.
pub fn custom_brief(record: &AnalysisRecord, instruction: &str, budget: BudgetTier) -> String {
    let room = &record.analysis;
    format!(
        "Transform this space based on the following request:\n\
         \n\
         USER'S VISION: {instruction}\n\
         \n\
         Current room details:\n\
         - Type: {room_type}\n\
         - Size: {size}\n\
         - Current condition: {condition}\n\
         - Key features: {features}\n\
         \n\
         Create a design that:\n\
         1. Fulfills the user's specific vision: \"{instruction}\"\n\
         2. Works with the existing space and features\n\
         3. Stays within {budget} budget range\n\
         4. Provides specific, actionable recommendations",
        room_type = room.room_type,
        size = room.dimensions_estimate,
        condition = room.condition,
        features = room.features.join(", "),
        budget = budget.as_str(),
    )
}

/// Text-only rendering request, used when there is no reference photo.
pub fn rendering_prompt(record: &AnalysisRecord, brief: &str, style: &str) -> String {
    format!(
        "Generate a photorealistic interior design rendering of a {room_type}.\n\
         \n\
         ROOM SPECIFICATIONS:\n\
         - Size: {size}\n\
         - Key features to maintain: {features}\n\
         \n\
         DESIGN BRIEF:\n\
         {brief}\n\
         \n\
         TARGET STYLE: {style}\n\
         \n\
         REQUIREMENTS:\n\
         - Photorealistic quality\n\
         - Maintain the room's structural features (windows, doors, layout)\n\
         - {style} aesthetic\n\
         - Professional interior design quality\n\
         - Warm, inviting atmosphere\n\
         - Proper lighting and shadows\n\
         - Realistic materials and textures\n\
         \n\
         Create a stunning, magazine-quality rendering that the homeowner can use to make \
         confident purchasing decisions.",
        room_type = record.analysis.room_type,
        size = record.analysis.dimensions_estimate,
        features = features_text(record),
    )
}

/// Vision+text request sent alongside the reference photo. It must ask for
/// prose only, with the length floor stated in the instruction.
pub fn reference_prompt(
    record: &AnalysisRecord,
    brief: &str,
    style: &str,
    custom_prompt: Option<&str>,
) -> String {
    let user_vision = custom_prompt
        .map(|vision| format!("\n\nUSER'S SPECIFIC VISION:\n{vision}\n"))
        .unwrap_or_default();
    format!(
        "You are an expert interior designer viewing a photograph of a real {room_type}.\n\
         \n\
         CURRENT ROOM ANALYSIS:\n\
         - Size: {size}\n\
         - Current features: {features}\n\
         - Current condition: Needs transformation\n\
         \n\
         YOUR TASK:\n\
         Analyze this room photo carefully and write a detailed TEXT description of how this \
         EXACT room would look after a complete {style} transformation.\n\
         \n\
         {brief}{user_vision}\n\
         \n\
         IMPORTANT: Provide a DETAILED TEXT DESCRIPTION ONLY. Do NOT generate or return images.\n\
         \n\
         In your TEXT description, include:\n\
         1. VISUAL TRANSFORMATION: Describe exactly how the room would look, referencing the \
         current layout and features you see\n\
         2. COLOR PALETTE: Specific paint colors (with brand names if possible), textile colors, \
         and accent colors\n\
         3. FURNITURE PLACEMENT: How to arrange or replace furniture you see in the image\n\
         4. LIGHTING DESIGN: Specific lighting fixtures and their exact placement\n\
         5. MATERIALS & TEXTURES: Flooring type, wall treatments, fabrics, and finishes\n\
         6. DECORATIVE ELEMENTS: Specific art pieces, plants, accessories, and styling details\n\
         7. SPATIAL IMPROVEMENTS: How to maximize the existing space and layout\n\
         8. SHOPPING GUIDE: Specific product recommendations with approximate prices\n\
         \n\
         Make this description so detailed and vivid that someone could visualize the \
         transformed room perfectly and use it to make confident purchasing decisions. \
         Reference specific elements you see in the current photo.\n\
         \n\
         Write at least 500 words.",
        room_type = record.analysis.room_type,
        size = record.analysis.dimensions_estimate,
        features = features_text(record),
    )
}

/// Prompt for the image-synthesis chain.
///
/// With a reference photo the model is told to keep layout, openings and
/// camera perspective and to change only decor. Nothing checks that it did.
pub fn synthesis_prompt(
    record: &AnalysisRecord,
    style: &str,
    custom_prompt: Option<&str>,
    with_reference: bool,
) -> String {
    let room_type = &record.analysis.room_type;
    let size = &record.analysis.dimensions_estimate;
    let items = custom_prompt.map(extract_key_items).unwrap_or_default();
    let mut prompt = String::new();

    if with_reference {
        prompt.push_str(&format!(
            "Transform this room image into a beautifully renovated {style} {room_type} while \
             KEEPING THE SAME ROOM LAYOUT, STRUCTURE, and PERSPECTIVE.\n\
             \n\
             IMPORTANT: You are transforming the uploaded room image, NOT creating a new room \
             from scratch.\n\
             \n\
             TRANSFORMATION REQUIREMENTS:\n\
             - MAINTAIN the exact room dimensions and layout you see in the image\n\
             - PRESERVE the locations of windows, doors, and architectural features\n\
             - KEEP the same camera angle and perspective\n\
             - Only MODIFY the interior design elements (furniture, colors, decor, lighting)\n\
             \n\
             TARGET STYLE: {style}\n\
             \n\
             ROOM SIZE: {size}"
        ));
        if let Some(vision) = custom_prompt {
            prompt.push_str(&format!("\n\nDESIGN VISION:\n{vision}"));
            if !items.is_empty() {
                prompt.push_str("\n\nITEMS TO INCLUDE:");
                for item in &items {
                    prompt.push_str(&format!("\n- {item}"));
                }
            }
        }
        prompt.push_str(&format!(
            "\n\nDESIGN REQUIREMENTS:\n\
             - Transform the EXISTING room in the image into {style} style\n\
             - Professional interior design quality\n\
             - Natural, warm lighting that enhances the space\n\
             - Photorealistic textures and materials\n\
             - Clean, well-organized, and beautifully styled\n\
             - Maintain the room's structure while upgrading the aesthetic\n\
             - No text, watermarks, or overlays"
        ));
        return prompt;
    }

    let features = record
        .analysis
        .features
        .iter()
        .take(3)
        .cloned()
        .collect::<Vec<_>>();
    let features = if features.is_empty() {
        "standard features".to_string()
    } else {
        features.join(", ")
    };
    prompt.push_str(&format!(
        "Create a photorealistic interior design photograph of a beautifully renovated {style} \
         {room_type}.\n\
         \n\
         ROOM SPECIFICATIONS:\n\
         - Size: {size} sized room\n\
         - Style: {style}\n\
         - Key architectural features to incorporate: {features}"
    ));
    if let Some(vision) = custom_prompt {
        prompt.push_str(&format!("\n\nDESIGN VISION:\n{vision}"));
        if !items.is_empty() {
            prompt.push_str("\n\nCRITICAL ITEMS TO INCLUDE (MUST BE VISIBLE):");
            for item in &items {
                prompt.push_str(&format!("\n- {item} (clearly visible and prominent)"));
            }
        }
    }
    prompt.push_str(
        "\n\nREQUIREMENTS:\n\
         - Professional interior photography quality\n\
         - Natural, warm lighting that enhances the space\n\
         - High resolution and sharp details\n\
         - Magazine-worthy composition\n\
         - Inviting and aspirational atmosphere\n\
         - Clean, well-organized, and styled\n\
         - Photorealistic textures and materials\n\
         - Proper depth of field and perspective\n\
         - ALL specified furniture and items must be clearly visible\n\
         - No text, watermarks, or overlays",
    );
    prompt
}

pub fn refinement_prompt(previous_description: &str, request: &str) -> String {
    format!(
        "You previously generated this interior design rendering:\n\
         \n\
         {previous_description}\n\
         \n\
         The user requests the following changes:\n\
         {request}\n\
         \n\
         Generate an updated photorealistic rendering incorporating these changes while \
         maintaining the overall design vision."
    )
}

pub fn assessment_task(analysis_json: &str) -> String {
    format!(
        "Based on this room analysis:\n\
         {analysis_json}\n\
         \n\
         Provide a professional assessment including:\n\
         1. Overall impression of the space\n\
         2. Key strengths to build upon\n\
         3. Design challenges to address\n\
         4. Recommendations for transformation\n\
         5. Budget-conscious suggestions"
    )
}

pub fn plan_task(rendering_json: &str, size: &str, room_type: &str, budget: BudgetTier) -> String {
    format!(
        "Based on this design rendering:\n\
         {rendering_json}\n\
         \n\
         For a {size} {room_type} with {budget} budget ({band}), create:\n\
         \n\
         1. BUDGET BREAKDOWN\n\
         \x20  - Materials (paint, flooring, fixtures)\n\
         \x20  - Furniture and decor\n\
         \x20  - Labor costs\n\
         \x20  - Contingency (10-15%)\n\
         \x20  - Total estimated cost\n\
         \n\
         2. PROJECT TIMELINE\n\
         \x20  - Planning phase\n\
         \x20  - Material sourcing\n\
         \x20  - Installation/construction\n\
         \x20  - Styling and finishing\n\
         \x20  - Total estimated duration\n\
         \n\
         3. CONTRACTOR RECOMMENDATIONS\n\
         \x20  - Types of contractors needed\n\
         \x20  - Skills required\n\
         \x20  - Estimated labor hours\n\
         \n\
         4. SHOPPING LIST\n\
         \x20  - Key items needed\n\
         \x20  - Suggested retailers\n\
         \x20  - Priority order for purchases",
        budget = budget.as_str(),
        band = budget.price_band(),
    )
}

#[derive(Debug, Clone, Copy)]
struct KeywordMatch {
    start: usize,
    end: usize,
    keyword: &'static str,
}

fn keyword_occurrences(lowered: &str) -> Vec<KeywordMatch> {
    let mut seen = HashSet::new();
    KEY_ITEM_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| seen.insert(*keyword))
        .flat_map(|keyword| {
            lowered
                .match_indices(keyword)
                .map(move |(start, matched)| KeywordMatch {
                    start,
                    end: start + matched.len(),
                    keyword,
                })
        })
        .collect()
}

fn contextual_label(keyword: &str, lowered: &str) -> Option<String> {
    let label = match keyword {
        "laptop" if lowered.contains("laptop table") || lowered.contains("laptop on") => {
            "Laptop computer on table (open and visible)"
        }
        "laptop" => "Laptop computer (open and visible)",
        // "bookshelf" itself contains "books".
        "shelf" | "bookshelf" if lowered.contains("books") => "Bookshelf filled with books",
        "shelf" | "bookshelf" => "Bookshelf",
        "lamp" if lowered.contains("study lamp") => "Study desk lamp (turned on)",
        "lamp" if lowered.contains("table lamp") => "Table lamp",
        _ => return None,
    };
    Some(label.to_string())
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Furnishing nouns named in a free-text instruction, in order of first
/// mention.
///
/// A keyword occurrence inside a longer keyword's occurrence does not count
/// ("coffee table" is not also a "table"), and a plain keyword already named
/// by a contextual label ("Study desk lamp") is not repeated.
pub fn extract_key_items(instruction: &str) -> Vec<String> {
    let lowered = instruction.to_lowercase();
    let occurrences = keyword_occurrences(&lowered);

    let mut firsts: Vec<KeywordMatch> = Vec::new();
    for occurrence in &occurrences {
        let covered = occurrences.iter().any(|other| {
            other.keyword.len() > occurrence.keyword.len()
                && other.start <= occurrence.start
                && occurrence.end <= other.end
        });
        if covered || firsts.iter().any(|kept| kept.keyword == occurrence.keyword) {
            continue;
        }
        firsts.push(*occurrence);
    }
    firsts.sort_by_key(|found| found.start);

    let labelled: Vec<(String, bool)> = firsts
        .iter()
        .map(|found| match contextual_label(found.keyword, &lowered) {
            Some(label) => (label, true),
            None => (title_case(found.keyword), false),
        })
        .collect();
    let contextual_text = labelled
        .iter()
        .filter(|(_, contextual)| *contextual)
        .map(|(label, _)| label.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut seen = HashSet::new();
    labelled
        .into_iter()
        .filter(|(label, contextual)| *contextual || !contextual_text.contains(&label.to_lowercase()))
        .map(|(label, _)| label)
        .filter(|label| seen.insert(label.to_lowercase()))
        .collect()
}
