use crate::{criteria::GradingCriteria, locale::Locale};

/// Builds the instruction block that accompanies the answer-sheet image.
///
/// The prompt is written in the session's language, so an Arabic session
/// asks for an Arabic-language teacher and gets its feedback in Arabic.
pub fn grading_prompt(criteria: &GradingCriteria, locale: Locale) -> String {
    let max = criteria.max_score;
    let answer = criteria.reference_answer.trim();

    match locale {
        Locale::English => {
            let instructions = criteria.instructions().unwrap_or("None");
            format!(
                "You are an expert teacher and a meticulous automated grader.\n\
                 Your task is to grade a student's handwritten answer sheet.\n\
                 \n\
                 Reference data:\n\
                 1. Reference answer (or the expected context): \"{answer}\"\n\
                 2. Maximum score for the question: {max}\n\
                 3. Additional instructions: \"{instructions}\"\n\
                 \n\
                 Steps:\n\
                 1. Read the handwritten text in the image accurately (OCR).\n\
                 2. Compare the student's answer with the reference answer by meaning and \
                 context, not by word-for-word matching. The student may phrase the answer in \
                 their own words.\n\
                 3. Decide the student's score out of {max}, as an integer or a fraction, based \
                 on how correct the meaning is and how complete the idea is.\n\
                 4. Give constructive feedback and point out the strengths and weaknesses of the \
                 answer.\n\
                 \n\
                 Important: be fair, and overlook minor spelling mistakes that do not change the \
                 meaning, unless the instructions say otherwise.\n"
            )
        }
        Locale::Arabic => {
            let instructions = criteria.instructions().unwrap_or("لا يوجد");
            format!(
                "أنت معلم خبير للغة العربية ومصحح آلي دقيق جداً.\n\
                 مهمتك هي تصحيح ورقة إجابة طالب مكتوبة بخط اليد.\n\
                 \n\
                 البيانات المرجعية:\n\
                 1. الإجابة النموذجية (أو السياق المطلوب): \"{answer}\"\n\
                 2. الدرجة العظمى للسؤال: {max}\n\
                 3. تعليمات إضافية: \"{instructions}\"\n\
                 \n\
                 الخطوات المطلوبة:\n\
                 1. قم بقراءة النص المكتوب بخط اليد في الصورة بدقة (OCR).\n\
                 2. قارن إجابة الطالب بالإجابة النموذجية من حيث المعنى والسياق وليس مجرد تطابق \
                 الكلمات. الإجابة قد تكون بأسلوب الطالب الخاص.\n\
                 3. حدد درجة الطالب من {max} بناءً على مدى صحة المعنى واكتمال الفكرة.\n\
                 4. قدم تغذية راجعة (Feedback) بناءة، ووضح نقاط القوة والضعف.\n\
                 \n\
                 ملاحظة هامة: كن عادلاً، وتجاوز عن الأخطاء الإملائية البسيطة إذا لم تخل بالمعنى، \
                 إلا إذا كانت التعليمات تنص على غير ذلك.\n"
            )
        }
    }
}
