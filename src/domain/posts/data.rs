use super::{Post, PostBlock};
use time::macros::date;

pub static POSTS: [Post; 3] = [
    Post {
        id: "post-1",
        title: "My First Blog Post",
        date: date!(2025 - 04 - 17),
        image: "screenshot-20251.jpg",
        content: &[
            PostBlock::Paragraph(
                "Welcome to my blog! This is a simple post created using React and Tailwind CSS. Here, I'll be talking about how to create beautiful websites using modern web technologies.",
            ),
            PostBlock::Heading {
                level: 2,
                text: "Why React?",
            },
            PostBlock::Paragraph(
                "React is a popular JavaScript library for building user interfaces. It allows developers to build fast and scalable web applications with reusable components.",
            ),
            PostBlock::Heading {
                level: 2,
                text: "Why Tailwind CSS?",
            },
            PostBlock::Paragraph(
                "Tailwind CSS is a utility-first CSS framework that provides everything you need to design your website. It’s fast to learn, highly customizable, and enables rapid prototyping.",
            ),
            PostBlock::Paragraph(
                "Tailwind helps make the development process more efficient and enjoyable, especially for beginners who want to focus more on the design and layout rather than spending time writing complex CSS.",
            ),
        ],
    },
    Post {
        id: "post-2",
        title: "Exploring JavaScript Tips",
        date: date!(2025 - 04 - 18),
        image: "script-js-25.jpg",
        content: &[
            PostBlock::Paragraph(
                "JavaScript is everywhere! From client-side interactivity to full-stack applications with Node.js, its flexibility makes it powerful.",
            ),
            PostBlock::Paragraph(
                "In this post, we’ll share some lesser-known but useful tips to improve your JS workflow.",
            ),
        ],
    },
    Post {
        id: "post-3",
        title: "Why Tailwind Just Works",
        date: date!(2025 - 04 - 19),
        image: "tailwind-css-25.jpg",
        content: &[
            PostBlock::Paragraph(
                "Tailwind CSS might look weird at first, but once you get the hang of it, you’ll wonder how you ever wrote CSS without it.",
            ),
            PostBlock::Paragraph(
                "Let’s explore how utility classes boost productivity and help maintain scalable UIs.",
            ),
        ],
    },
];
