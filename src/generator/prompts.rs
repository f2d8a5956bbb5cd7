//! 各阶段提示词
//!
//! 提示词与校验用的肯定词均为俄语；校验阶段只认「да」。

use crate::tools::GET_IMAGES_TOOL;

/// 校验通过的肯定词（大小写不敏感地包含即可）
pub const AFFIRMATIVE: &str = "да";
/// 校验未通过时模型应回复的否定词
pub const NEGATIVE: &str = "нет";

const RAW_MARKUP_ONLY: &str = "Не оборачивай ответ в форматирование вида ```html в начале и ``` в конце. \
В ответе нужен ТОЛЬКО код HTML+CSS+JS, без каких-либо пояснений.";

pub fn site_title(user_prompt: &str) -> String {
    format!(
        "Придумай название сайта по тематике запроса: '{user_prompt}'. \
         Название должно состоять не более чем из 3 слов, разделённых пробелами. \
         Пришли только само название и ничего больше."
    )
}

pub fn find_images(user_prompt: &str) -> String {
    format!(
        "Ты получил запрос: '{user_prompt}'. Выбери из него от 1 до 5 ключевых слов тематики, \
         на которых будет построен сайт, и с помощью инструмента {GET_IMAGES_TOOL} \
         найди по этому списку слов url картинок. \
         Со списком url пока ничего делать не нужно: \
         эти картинки понадобятся в следующем запросе."
    )
}

pub fn generate_html(user_prompt: &str, current_year: i32) -> String {
    format!(
        "Ты -- фронтенд-разработчик. \
         Ответ должен вставляться в HTML-файл без дополнительной правки. \
         Страница должна содержать анимированные заголовки, параллакс фона и другие визуальные украшения, \
         если в запросе прямо не сказано, что сайт должен быть без анимаций. \
         Запрос может содержать ссылки на изображения, которые нужно использовать на странице. \
         Если ссылок нет или их недостаточно, используй картинки, найденные ранее. \
         {RAW_MARKUP_ONLY} \
         Обработай запрос: '{user_prompt}'. \
         Сейчас {current_year} год."
    )
}

pub const CHECK_HTML: &str = "Проверь качество сгенерированной страницы. \
Проверь ссылки на все картинки в html: ни одна не должна возвращать 404. \
Если всё хорошо, ответь 'да', если страницу нужно перегенерировать, ответь 'нет'. \
Больше ничего не пиши.";

pub fn regenerate_html(user_prompt: &str) -> String {
    format!(
        "Проверь качество сгенерированной страницы и сгенерируй новую с учётом всех возможных улучшений. \
         {RAW_MARKUP_ONLY} \
         Исходный запрос: '{user_prompt}'."
    )
}

/// 校验回复是否为肯定（大小写不敏感，包含 AFFIRMATIVE 即可）
pub fn is_affirmative(answer: &str) -> bool {
    answer.to_lowercase().contains(AFFIRMATIVE)
}
