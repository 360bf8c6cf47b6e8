//! Fixed instruction text sent with every image.
//!
//! Three segments: role framing, per-criterion task rules, and the output
//! template the report parser depends on. The criteria are emitted from
//! [`Criterion::ALL`] so prompt order and parse order cannot drift apart.

use photocritic_core::Criterion;

const ROLE: &str = "You are an expert AI tasked with evaluating LinkedIn profile photos and \
providing detailed feedback on their quality. Your feedback should be professional, \
constructive, and aimed at helping users improve their profile images.";

const TASK_INTRO: &str = "You will receive an image file of a LinkedIn profile photo.\n\n\
Your task is to provide a structured report analyzing the image based on the following criteria:";

const FINAL_REVIEW_RULE: &str = "Conclude with a summary of whether the image is suitable for a \
LinkedIn profile photo and provide the rationale for your assessment.";

const SCORE_RULE: &str = "(Include a confidence score for this assessment.)";

pub struct PromptBuilder;

impl PromptBuilder {
    /// The complete prompt. Identical on every call.
    pub fn build() -> String {
        format!(
            "{}\n\n{}\n\n{}\n",
            Self::role(),
            Self::instructions(),
            Self::output_template()
        )
    }

    pub fn role() -> &'static str {
        ROLE
    }

    /// Task rules, one paragraph per criterion in template order.
    pub fn instructions() -> String {
        let mut out = String::from(TASK_INTRO);
        for criterion in Criterion::ALL {
            out.push_str(&format!(
                "\n\n{}:\n\n{} {}",
                criterion.title(),
                guidance(criterion),
                SCORE_RULE
            ));
        }
        out.push_str(&format!("\n\nFinal review:\n\n{FINAL_REVIEW_RULE}"));
        out
    }

    /// The mandated reply shape: bold numbered headings, description, then
    /// `(confidence: N%)`, closing with a bold `Final review:` section.
    pub fn output_template() -> String {
        let mut out = String::from(
            "Your report must be structured exactly like the template below. \
Wrap every heading in double asterisks, put the description on the next line, \
and end the description with the confidence in parentheses.\n",
        );
        for criterion in Criterion::ALL {
            out.push_str(&format!(
                "\n**{}. {}:**\n[Your description and analysis.] (confidence: [score here]%)\n",
                criterion.position(),
                criterion.title()
            ));
        }
        out.push_str("\n**Final review:**\n[Your review]\n\n");
        out.push_str(
            "Each confidence score is a whole number from 0 to 100.\n\
Don't copy the template text. Write your own report.\n\
Always keep your output in this format.",
        );
        out
    }
}

fn guidance(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::ResolutionAndClarity => {
            "Evaluate the resolution and clarity of the image. Determine if the image is blurry \
or pixelated, which may affect the visibility of features. If the image lacks clarity, suggest \
the user upload a higher-resolution photo."
        }
        Criterion::ProfessionalAppearance => {
            "Assess the attire of the person in the image. Describe what they are wearing and \
whether it is suitable for a professional setting. Also evaluate the background. If the \
background is simple and uncluttered, mention that it helps keep the focus on the person. If \
the attire or background is unsuitable, recommend more formal clothing or a plain background, \
respectively."
        }
        Criterion::FaceVisibility => {
            "Examine how clearly the person's face is visible. If the face is unobstructed and \
clearly visible, note this. If the face is partially covered by objects or hair, or if the \
person is looking away, provide feedback and suggest looking directly into the camera for a \
stronger connection."
        }
        Criterion::AppropriateExpression => {
            "Analyze the person's expression. If the expression is friendly and approachable, \
acknowledge this. If the expression appears overly serious or unprofessional, suggest a more \
relaxed and natural smile."
        }
        Criterion::FiltersAndDistortions => {
            "Review any filters or distortions applied to the image. If the image appears \
natural, note this. If it is excessively filtered or retouched, recommend using a more \
natural-looking photo."
        }
        Criterion::SinglePersonNoPets => {
            "Identify the number of people and pets in the image. If only the user is present, \
confirm this. If there are multiple people or pets, suggest cropping the image to eliminate \
distractions."
        }
    }
}
