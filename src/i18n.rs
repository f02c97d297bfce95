//! Languages, personas, and the user-facing copy for each.
//!
//! Only English and Hindi have their own copy; every other language
//! falls back to English text while still being sent to the API as-is.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    #[default]
    En,
    Bn,
    Gu,
    Hi,
    Kn,
    Ml,
    Mr,
    Or,
    Pa,
    Ta,
    Te,
}

impl Language {
    /// Menu order.
    pub const ALL: [Language; 11] = [
        Language::En,
        Language::Bn,
        Language::Gu,
        Language::Hi,
        Language::Kn,
        Language::Ml,
        Language::Mr,
        Language::Or,
        Language::Pa,
        Language::Ta,
        Language::Te,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
            Language::Gu => "gu",
            Language::Hi => "hi",
            Language::Kn => "kn",
            Language::Ml => "ml",
            Language::Mr => "mr",
            Language::Or => "or",
            Language::Pa => "pa",
            Language::Ta => "ta",
            Language::Te => "te",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Native name shown on the language button.
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Bn => "বাংলা",
            Language::Gu => "ગુજરાતી",
            Language::Hi => "हिंदी",
            Language::Kn => "ಕನ್ನಡ",
            Language::Ml => "മലയാളം",
            Language::Mr => "मराठी",
            Language::Or => "ଓଡ଼ିଆ",
            Language::Pa => "ਪੰਜਾਬੀ",
            Language::Ta => "தமிழ்",
            Language::Te => "తెలుగు",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Persona {
    #[default]
    Story,
    Teacher,
    Parent,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Story, Persona::Teacher, Persona::Parent];

    pub fn code(&self) -> &'static str {
        match self {
            Persona::Story => "story",
            Persona::Teacher => "teacher",
            Persona::Parent => "parent",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One string per persona.
#[derive(Debug, Clone, Copy)]
pub struct PerPersona {
    pub story: &'static str,
    pub teacher: &'static str,
    pub parent: &'static str,
}

impl PerPersona {
    pub fn get(&self, persona: Persona) -> &'static str {
        match persona {
            Persona::Story => self.story,
            Persona::Teacher => self.teacher,
            Persona::Parent => self.parent,
        }
    }
}

/// Entry for `language`, or the English entry when it has none.
pub fn lookup<T: Copy>(language: Language, table: &[(Language, T)]) -> Option<T> {
    table
        .iter()
        .find(|(l, _)| *l == language)
        .or_else(|| table.iter().find(|(l, _)| *l == Language::En))
        .map(|(_, v)| *v)
}

pub const WELCOME_BANNER: &str = "Namaste 🙏\nWelcome to *My Jaadui Pitara*";
pub const HELP_TEXT: &str = "Help!";
pub const LANGUAGE_MENU_PROMPT: &str = "\nPlease select a Language to proceed";
pub const GENERIC_ERROR: &str = "An error has been encountered. Please try again.";
pub const FEEDBACK_PROMPT: &str = "Please provide your feedback";
pub const FEEDBACK_REDRAW_PROMPT: &str = "Please provide your feedback:";
pub const FEEDBACK_THANKS: &str = "Thanks for your feedback.";

const PERSONA_MENU_PROMPT: &[(Language, &str)] = &[
    (
        Language::En,
        "
*My Jaadui Pitara*
I am here to help you with amazing stories and activities that you can engage your children with.

Please select Story Sakhi for creating your own story
Please select Parent Sakhi for getting suggestions of activities that you can engage with your children at home
Please select Teacher Sakhi for getting suggestions of activities that you can engage with your children at school
",
    ),
    (
        Language::Hi,
        "
*मेरा जादुई पिटारा*
मैं यहां अद्भुत कहानियों और गतिविधियों के साथ आपकी मदद करने के लिए हूं, जिनमें आप अपने बच्चों को शामिल कर सकते हैं।

अपनी कहानी बनाने के लिए कहानी सखी का चयन करें
आप घर पर अपने बच्चों के साथ शामिल करनेके गतिविधियों के सुझाव प्राप्त करने के लिए अभिभवक सखी का चयन करें
आप स्कूल में अपने बच्चों के साथ शामिल करनेके गतिविधियों के सुझाव प्राप्त करने के लिए शिक्षक सखी का चयन करें
",
    ),
];

const PERSONA_LABELS: &[(Language, PerPersona)] = &[
    (
        Language::En,
        PerPersona {
            story: "Story Sakhi",
            teacher: "Teacher Sakhi",
            parent: "Parent Sakhi",
        },
    ),
    (
        Language::Hi,
        PerPersona {
            story: "कहानी सखी",
            teacher: "शिक्षक सखी",
            parent: "अभिभावक सखी",
        },
    ),
];

const PERSONA_WELCOME: &[(Language, PerPersona)] = &[
    (
        Language::En,
        PerPersona {
            story: "
Welcome to *Story Sakhi!*
I can create a story for you about what you ask for.

For example:
- I can tell a story about a girl who saw the sea for the first time.
- I can tell a story about a Monkey and a Frog

Ask me about anything that you want. You can type or speak.
",
            teacher: "
Welcome to *Teacher Sakhi!*
I can suggest you activities that you can do with your students (of age 3 to 8 years) at schools.
I can also answer your questions about the play based learning suggested in the new NCF for Foundational Stage.
Here are few examples of what you can ask.

Examples:
- What activity can I do with students to teach sorting or counting numbers
- How can I conduct my class with children with special needs
- What can I do to engage a child who is always distracted.
I can answer your questions about the new NCF

Ask me about anything that you want. You can type or speak.
",
            parent: "
Welcome to *Parent Sakhi!*
I can suggest you activities that you can do with your children at home. Here are few examples of what you can ask:

Examples:
- What activity can I do with my child using vegetables in your kitchen
- Suggest how I can make my child interested in household activities
- My child does not eat nutritious food, what to do

Ask me about anything that you want. You can type or speak.
",
        },
    ),
    (
        Language::Hi,
        PerPersona {
            story: "
*कहानी सखी* में आपका स्वागत है!
आप जो मांगेंगे उसके बारे में मैं आपके लिए एक कहानी बना सकता हूं।

उदाहरण के लिए:
- मैं उस लड़की की कहानी बता सकता हूँ जिसने पहली बार समुद्र देखा।
- मैं एक बंदर और मेंढक के बारे में एक कहानी बता सकता हूँ

आप जो चाहते हो वो मुझसे पूछ सकते हैं। आप टाइप कर सकते हैं या बोल सकते हैं।
",
            teacher: "
*शिक्षक सखी* में आपका स्वागत है!
मैं आपको ऐसी गतिविधियाँ सुझा सकता हूँ जो आप स्कूलों में अपने छात्रों (3 से 8 वर्ष की आयु के) के साथ कर सकते हैं।
मैं फाउंडेशनल स्टेज के लिए नए एनसीएफ में सुझाए गए खेल आधारित शिक्षण के बारे में आपके सवालों का जवाब भी दे सकता हूं।
यहां कुछ उदाहरण दिए गए हैं कि आप क्या पूछ सकते हैं।

उदाहरण:
- संख्याओं को क्रमबद्ध करना या गिनना सिखाने के लिए मैं विद्यार्थियों के साथ कौन सी गतिविधि कर सकता हूँ?
- मैं विशेष आवश्यकता वाले बच्चों के साथ अपनी कक्षा कैसे संचालित कर सकता हूँ?
- मैं उस बच्चे को व्यस्त रखने के लिए क्या कर सकता हूं जो हमेशा विचलित रहता है?
- मैं नए एनसीएफ के बारे में आपके सवालों का जवाब दे सकता हूं

आप जो चाहते हो वो मुझसे पूछ सकते हैं। आप टाइप कर सकते हैं या बोल सकते हैं।
",
            parent: "
*अभिभावक सखी* में आपका स्वागत है!
मैं आपको ऐसी गतिविधियाँ सुझा सकता हूँ जो आप घर पर अपने बच्चों के साथ कर सकते हैं। यहां कुछ उदाहरण दिए गए हैं कि आप क्या पूछ सकते हैं:

उदाहरण:
- मैं आपकी रसोई में सब्जियों का उपयोग करके अपने बच्चे के साथ कौन सी गतिविधि कर सकता हूँ?
- सुझाव दीजिए कि मैं अपने बच्चे की घरेलू गतिविधियों में रुचि कैसे पैदा कर सकता हूँ
- मेरा बच्चा पौष्टिक खाना नहीं खाता, क्या करूं?

आप जो चाहते हो वो मुझसे पूछ सकते हैं। आप टाइप कर सकते हैं या बोल सकते हैं।
",
        },
    ),
];

const LOADER: &[(Language, &str)] = &[
    (Language::En, "Please wait, crafting response. It might take upto a minute."),
    (
        Language::Hi,
        "कृपया प्रतीक्षा करें, प्रतिक्रिया तैयार कर रहा हूँ। इसमें एक मिनट तक लग सकता है.",
    ),
];

pub fn persona_menu_prompt(language: Language) -> &'static str {
    lookup(language, PERSONA_MENU_PROMPT).unwrap_or_default()
}

pub fn persona_label(language: Language, persona: Persona) -> &'static str {
    lookup(language, PERSONA_LABELS)
        .map(|labels| labels.get(persona))
        .unwrap_or_else(|| persona.code())
}

pub fn persona_welcome(language: Language, persona: Persona) -> &'static str {
    lookup(language, PERSONA_WELCOME)
        .map(|texts| texts.get(persona))
        .unwrap_or_default()
}

pub fn loader_message(language: Language) -> &'static str {
    lookup(language, LOADER).unwrap_or_default()
}
