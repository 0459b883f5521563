//! Offline question synthesis used whenever the completion API cannot help.

use rand::{Rng, seq::IndexedRandom};
use uuid::Uuid;

use crate::state::game::{Difficulty, Question};

/// Category used when a category has no dedicated word lists.
pub const FALLBACK_CATEGORY: &str = "Random";

/// Word lists for one category. `{item}` and `{restriction}` are substituted.
struct CategoryTemplates {
    templates: &'static [&'static str],
    items: &'static [&'static str],
    restrictions: &'static [&'static str],
}

const OBJECT: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe a {item} without using the words {restriction}",
        "Explain what a {item} is to someone who's never seen one",
        "Describe the shape and function of a {item} without naming it",
        "Explain how to use a {item} without mentioning its purpose",
        "Describe a {item} as if you're from another planet",
    ],
    items: &[
        "chair", "table", "phone", "computer", "book", "pen", "watch", "lamp", "backpack",
        "headphones", "umbrella", "sunglasses", "wallet", "mirror", "television",
        "refrigerator", "toaster", "camera", "bicycle", "clock",
    ],
    restrictions: &[
        "using it", "touching it", "purpose", "function", "common words", "its name",
        "its size", "its color", "its material", "buying it",
    ],
};

const NATURE: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe a {item} without using the words {restriction}",
        "Explain what makes a {item} unique without mentioning its appearance",
        "Describe the experience of encountering a {item} without visual terms",
        "Explain the life cycle of a {item} without using scientific terms",
        "Describe the sound and feel of a {item} without mentioning its environment",
    ],
    items: &[
        "mountain", "river", "ocean", "forest", "desert", "waterfall", "volcano", "canyon",
        "beach", "lake", "island", "cave", "glacier", "reef", "jungle", "valley", "geyser",
        "tundra", "meadow", "swamp",
    ],
    restrictions: &[
        "size", "color", "location", "weather", "animals", "plants", "water", "rocks", "sky",
        "beautiful",
    ],
};

const PERSON: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe what a {item} does without mentioning their workplace",
        "Explain the skills needed to be a {item} without naming their profession",
        "Describe a day in the life of a {item} without mentioning their job title",
        "Explain how someone becomes a {item} without mentioning education",
        "Describe what makes a great {item} without using job-related terms",
    ],
    items: &[
        "doctor", "teacher", "chef", "artist", "musician", "athlete", "scientist", "writer",
        "engineer", "firefighter", "pilot", "architect", "photographer", "actor", "dancer",
        "programmer", "detective", "farmer", "astronaut", "veterinarian",
    ],
    restrictions: &[
        "job title", "workplace", "uniform", "tools", "education", "salary", "skills",
        "training", "experience", "colleagues",
    ],
};

const ACTION: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe {item} without moving the relevant body parts",
        "Explain how to go {item} to someone who's never done it before",
        "Describe the feeling of {item} without mentioning physical sensations",
        "Explain the purpose of {item} without mentioning its outcome",
        "Describe {item} as if you're teaching an alien",
    ],
    items: &[
        "running", "swimming", "dancing", "singing", "cooking", "climbing", "writing",
        "reading", "painting", "laughing", "jumping", "driving", "flying", "diving",
        "throwing", "catching", "building", "digging", "planting", "fishing",
    ],
    restrictions: &[
        "body parts", "movement", "speed", "direction", "purpose", "energy", "technique",
        "practice", "learning", "demonstrating",
    ],
};

const WORLD: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe {item} without mentioning its location or famous features",
        "Explain what makes {item} special without mentioning tourism",
        "Describe the culture of {item} without naming foods or traditions",
        "Explain the history of {item} without mentioning dates or events",
        "Describe what you would experience visiting {item} without visual descriptions",
    ],
    items: &[
        "Tokyo", "New York", "Paris", "Amazon Rainforest", "Great Barrier Reef",
        "Sahara Desert", "Antarctica", "Great Wall of China", "Grand Canyon", "Venice",
        "Mount Everest", "Rome", "London", "Cairo", "Sydney", "Rio de Janeiro", "Moscow",
        "Cape Town", "Mumbai", "Bangkok",
    ],
    restrictions: &[
        "location", "people", "landmarks", "famous for", "tourism", "language", "food",
        "weather", "history", "population",
    ],
};

const RANDOM: CategoryTemplates = CategoryTemplates {
    templates: &[
        "Describe the concept of {item} without using technical terms",
        "Explain {item} to a 5-year-old child",
        "Describe how {item} affects everyday life without examples",
        "Explain the importance of {item} without mentioning benefits",
        "Describe how {item} has changed over time without mentioning technology",
    ],
    items: &[
        "time", "happiness", "friendship", "music", "knowledge", "freedom", "creativity",
        "memory", "communication", "celebration", "teamwork", "education", "innovation",
        "tradition", "progress", "competition", "diversity", "balance", "transformation",
        "identity",
    ],
    restrictions: &[
        "examples", "definitions", "explaining", "comparing", "common terms",
        "technical words", "simple terms", "analogies", "scenarios", "measurements",
    ],
};

fn templates_for(category: &str) -> &'static CategoryTemplates {
    match category {
        "Object" => &OBJECT,
        "Nature" => &NATURE,
        "Person" => &PERSON,
        "Action" => &ACTION,
        "World" => &WORLD,
        _ => &RANDOM,
    }
}

/// Pick a difficulty: 30% easy, 40% medium, 30% hard.
pub fn random_difficulty<R: Rng + ?Sized>(rng: &mut R) -> Difficulty {
    match rng.random_range(0..10) {
        0..3 => Difficulty::Easy,
        3..7 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Synthesize `count` questions for an already normalized `category`.
pub fn generate(category: &str, count: usize) -> Vec<Question> {
    let mut rng = rand::rng();
    let lists = templates_for(category);

    (0..count)
        .map(|_| {
            let template = lists.templates.choose(&mut rng).copied().unwrap_or("{item}");
            let item = lists.items.choose(&mut rng).copied().unwrap_or("something");
            let mut text = template.replace("{item}", item);
            if text.contains("{restriction}") {
                let restriction = lists
                    .restrictions
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or("its name");
                text = text.replace("{restriction}", restriction);
            }

            Question {
                id: Uuid::new_v4().to_string(),
                category: category.to_string(),
                text,
                difficulty: random_difficulty(&mut rng),
                used: false,
            }
        })
        .collect()
}
